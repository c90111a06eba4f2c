// Transition Engine - deposits, spends, merges and withdrawal starts
//
// Each transition validates against current state, derives output ids,
// then commits one atomic batch. Validation failures never touch the store.
// Races that slip past validation are caught by the store itself: a
// guarded delete of an already deleted unit or a create of an existing id
// rejects the whole batch.

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::history::{CheckpointAccessor, ProvenanceTracer};
use crate::identity::{
    derive_id, derive_merge_id, Address, AuthorizationVerifier, SpendSignature, TxHash, UnitId,
};
use crate::ledger::{DepositRecord, MergeRecord, SpendRecord, Unit, UnitLedger, WithdrawalRecord};
use crate::storage::{LedgerStore, Statement, WriteBatch};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// A deposit observed on the root chain
#[derive(Clone, Debug)]
pub struct DepositRequest {
    pub owner: Address,
    pub value: u64,
    pub tx_hash: TxHash,
    pub token_id: String,
    pub chain_id: u64,
}

impl DepositRequest {
    /// Deposit of the default token on chain 0
    pub fn new(owner: Address, value: u64, tx_hash: TxHash) -> Self {
        Self {
            owner,
            value,
            tx_hash,
            token_id: String::new(),
            chain_id: 0,
        }
    }

    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = token_id.into();
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }
}

/// Units created by a spend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpendOutcome {
    /// Transfer output, owned by the recipient
    pub new_id1: UnitId,
    /// Change output, owned by the previous owner
    pub new_id2: Option<UnitId>,
    /// Position of the spend in the spend log
    pub seq: u64,
}

/// Unit created by a merge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    pub new_id: UnitId,
    pub value: u64,
}

/// Applies ledger transitions over an injected store
pub struct TransitionEngine {
    store: Arc<dyn LedgerStore>,
    units: UnitLedger,
    verifier: AuthorizationVerifier,
    provenance: ProvenanceTracer,
    checkpoints: CheckpointAccessor,
}

impl TransitionEngine {
    /// Create an engine over `store`. Fails if `config` is invalid.
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self {
            units: UnitLedger::new(store.clone()),
            verifier: AuthorizationVerifier::new(),
            provenance: ProvenanceTracer::new(store.clone(), config.max_provenance_depth),
            checkpoints: CheckpointAccessor::new(store.clone(), config.max_checkpoint_window),
            store,
        })
    }

    pub fn units(&self) -> &UnitLedger {
        &self.units
    }

    pub fn provenance(&self) -> &ProvenanceTracer {
        &self.provenance
    }

    pub fn checkpoints(&self) -> &CheckpointAccessor {
        &self.checkpoints
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    // ========================================================================
    // DEPOSITS
    // ========================================================================

    /// Log a deposit and create its root unit, whose id is the deposit's
    /// transaction hash. A redelivered deposit fails with `DuplicateId`.
    pub fn record_deposit(&self, request: DepositRequest) -> Result<Unit, LedgerError> {
        let unit = Unit::new(
            request.tx_hash,
            request.owner,
            request.value,
            request.token_id.clone(),
            request.chain_id,
        );
        let deposit = DepositRecord {
            tx_hash: request.tx_hash,
            owner: request.owner,
            value: request.value,
            token_id: request.token_id,
            chain_id: request.chain_id,
            created_at: Utc::now(),
        };
        let batch = WriteBatch::new()
            .with(Statement::InsertDeposit(deposit))
            .with(Statement::CreateUnit(unit.clone()));

        self.store.execute(&batch).map_err(|e| {
            let err = LedgerError::from(e);
            warn!(tx = %request.tx_hash, error = %err, "deposit rejected");
            err
        })?;

        info!(unit = %unit.id(), owner = %unit.owner(), value = unit.value(), "deposit recorded");
        Ok(unit)
    }

    // ========================================================================
    // SPENDS
    // ========================================================================

    /// Move `value` out of `unit_id` to `recipient`, authorized by the
    /// owner's signature over the spend message.
    ///
    /// Checks run in order and stop at the first failure: signature
    /// recovery, existence, ownership, value, not already spent. A spend
    /// whose two outputs would derive the same id is refused with
    /// `OutputCollision`.
    pub fn spend(
        &self,
        unit_id: &UnitId,
        recipient: &Address,
        value: u64,
        signature: &SpendSignature,
    ) -> Result<SpendOutcome, LedgerError> {
        let result = self.try_spend(unit_id, recipient, value, signature);
        if let Err(err) = &result {
            warn!(unit = %unit_id, to = %recipient, value, error = %err, "spend rejected");
        }
        result
    }

    fn try_spend(
        &self,
        unit_id: &UnitId,
        recipient: &Address,
        value: u64,
        signature: &SpendSignature,
    ) -> Result<SpendOutcome, LedgerError> {
        let signer = self
            .verifier
            .verify_spend_authorization(unit_id, recipient, value, signature)?;
        let unit = self.units.get(unit_id)?;

        if signer != *unit.owner() {
            return Err(LedgerError::UnauthorizedSigner {
                unit: *unit_id,
                signer,
                owner: *unit.owner(),
            });
        }
        if value > unit.value() {
            return Err(LedgerError::InsufficientValue {
                unit: *unit_id,
                available: unit.value(),
                requested: value,
            });
        }
        if unit.is_deleted() {
            return Err(LedgerError::AlreadySpent(*unit_id));
        }

        let new_id1 = derive_id(unit_id, recipient, value);
        let change = unit.value() - value;
        let new_id2 = (change > 0).then(|| derive_id(unit_id, unit.owner(), change));
        if new_id2 == Some(new_id1) {
            // owner paying itself exactly half derives one id for both outputs
            return Err(LedgerError::OutputCollision(new_id1));
        }

        let mut batch = WriteBatch::new()
            .with(Statement::MarkDeleted {
                id: *unit_id,
                expect_live: true,
            })
            .with(Statement::CreateUnit(unit.successor(new_id1, *recipient, value)));
        if let Some(change_id) = new_id2 {
            batch.push(Statement::CreateUnit(unit.successor(change_id, *unit.owner(), change)));
        }
        batch.push(Statement::AppendSpend(SpendRecord::new(
            *unit_id,
            value,
            *recipient,
            new_id1,
            new_id2,
            *signature,
        )));

        let receipt = self.store.execute(&batch)?;
        let seq = receipt.spend_seqs.first().copied().ok_or_else(|| {
            LedgerError::StoreFailure("store did not assign a spend sequence".into())
        })?;

        info!(
            unit = %unit_id,
            to = %recipient,
            value,
            change,
            seq,
            "spend committed"
        );
        Ok(SpendOutcome {
            new_id1,
            new_id2,
            seq,
        })
    }

    // ========================================================================
    // MERGES
    // ========================================================================

    /// Fold two units of the same owner into one unit holding their sum.
    ///
    /// Each input is checked on its own; the error names the failing unit.
    pub fn merge(
        &self,
        id1: &UnitId,
        id2: &UnitId,
        signature: &SpendSignature,
    ) -> Result<MergeOutcome, LedgerError> {
        let result = self.try_merge(id1, id2, signature);
        if let Err(err) = &result {
            warn!(unit1 = %id1, unit2 = %id2, error = %err, "merge rejected");
        }
        result
    }

    fn try_merge(
        &self,
        id1: &UnitId,
        id2: &UnitId,
        signature: &SpendSignature,
    ) -> Result<MergeOutcome, LedgerError> {
        if id1 == id2 {
            return Err(LedgerError::SameUnit(*id1));
        }
        let signer = self.verifier.verify_merge_authorization(id1, id2, signature)?;
        let unit1 = self.merge_input(id1, &signer)?;
        let unit2 = self.merge_input(id2, &signer)?;

        let total = unit1
            .value()
            .checked_add(unit2.value())
            .ok_or(LedgerError::ValueOverflow)?;
        let new_id = derive_merge_id(id1, id2, &signer, total);

        let batch = WriteBatch::new()
            .with(Statement::MarkDeleted {
                id: *id1,
                expect_live: true,
            })
            .with(Statement::MarkDeleted {
                id: *id2,
                expect_live: true,
            })
            .with(Statement::CreateUnit(unit1.successor(new_id, signer, total)))
            .with(Statement::AppendMerge(MergeRecord {
                id1: *id1,
                id2: *id2,
                new_id,
                owner: signer,
                value: total,
                signature: *signature,
                created_at: Utc::now(),
            }));
        self.store.execute(&batch)?;

        info!(unit1 = %id1, unit2 = %id2, new_unit = %new_id, value = total, "merge committed");
        Ok(MergeOutcome {
            new_id,
            value: total,
        })
    }

    fn merge_input(&self, id: &UnitId, signer: &Address) -> Result<Unit, LedgerError> {
        let unit = self.units.get(id)?;
        if unit.owner() != signer {
            return Err(LedgerError::UnauthorizedSigner {
                unit: *id,
                signer: *signer,
                owner: *unit.owner(),
            });
        }
        if unit.is_deleted() {
            return Err(LedgerError::AlreadySpent(*id));
        }
        Ok(unit)
    }

    // ========================================================================
    // WITHDRAWALS
    // ========================================================================

    /// Log a withdrawal started on the root chain and flag the unit as
    /// withdrawn. The unit stays spendable; settling a challenged exit is
    /// the caller's job.
    pub fn record_withdrawal_started(
        &self,
        unit_id: &UnitId,
        started_tx: &TxHash,
        token_id: impl Into<String>,
        chain_id: u64,
    ) -> Result<WithdrawalRecord, LedgerError> {
        if let Err(err) = self.units.get(unit_id) {
            warn!(unit = %unit_id, error = %err, "withdrawal rejected");
            return Err(err);
        }

        let record = WithdrawalRecord {
            unit_id: *unit_id,
            started_tx: *started_tx,
            token_id: token_id.into(),
            chain_id,
            completed: false,
            created_at: Utc::now(),
        };
        let batch = WriteBatch::new()
            .with(Statement::AppendWithdrawal(record.clone()))
            .with(Statement::MarkWithdrawn(*unit_id));
        self.store.execute(&batch)?;

        info!(unit = %unit_id, tx = %started_tx, "withdrawal started");
        Ok(record)
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Spendable units of `owner`
    pub fn list_by_owner(&self, owner: &Address) -> Result<Vec<Unit>, LedgerError> {
        self.units.list_by_owner(owner)
    }

    /// Spends that led to `unit_id`, most recent first
    pub fn trace_provenance(&self, unit_id: &UnitId) -> Result<Vec<SpendRecord>, LedgerError> {
        self.provenance.trace(unit_id)
    }

    pub fn get_deposit(&self, tx_hash: &TxHash) -> Result<Option<DepositRecord>, LedgerError> {
        Ok(self.store.get_deposit(tx_hash)?)
    }

    pub fn get_merge(&self, new_id: &UnitId) -> Result<Option<MergeRecord>, LedgerError> {
        Ok(self.store.get_merge(new_id)?)
    }

    pub fn withdrawals_for(&self, unit_id: &UnitId) -> Result<Vec<WithdrawalRecord>, LedgerError> {
        Ok(self.store.withdrawals_for(unit_id)?)
    }
}
