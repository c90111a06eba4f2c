// SledStore - transactional ledger storage on sled
//
// Layout (one tree per record kind):
// - units:         unit id -> Unit
// - owner_units:   owner || unit id -> ()
// - deposits:      tx hash -> DepositRecord
// - spends:        seq (big-endian) -> SpendRecord
// - spend_outputs: output unit id -> seq
// - merges:        new unit id -> MergeRecord
// - withdrawals:   unit id || started tx -> WithdrawalRecord
// - meta:          counters

use crate::config::StoreConfig;
use crate::identity::{Address, TxHash, UnitId};
use crate::ledger::{DepositRecord, MergeRecord, SpendRecord, Unit, WithdrawalRecord};
use crate::storage::store::{
    BatchReceipt, LedgerStore, Statement, StorageStats, StoreError, WriteBatch,
};
use serde::de::DeserializeOwned;
use sled::transaction::{
    abort, ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::Transactional;
use std::path::Path;
use tracing::debug;

/// Tree names
mod trees {
    pub const UNITS: &str = "units";
    pub const OWNER_UNITS: &str = "owner_units";
    pub const DEPOSITS: &str = "deposits";
    pub const SPENDS: &str = "spends";
    pub const SPEND_OUTPUTS: &str = "spend_outputs";
    pub const MERGES: &str = "merges";
    pub const WITHDRAWALS: &str = "withdrawals";
    pub const META: &str = "meta";
}

const SPEND_SEQ_KEY: &[u8] = b"spend_seq";

fn seq_key(seq: u64) -> [u8; 8] {
    seq.to_be_bytes()
}

fn decode_seq(bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::DeserializationFailed("Invalid sequence key length".into()))?;
    Ok(u64::from_be_bytes(arr))
}

fn owner_key(owner: &Address, id: &UnitId) -> Vec<u8> {
    [owner.as_bytes().as_slice(), id.as_bytes().as_slice()].concat()
}

fn withdrawal_key(unit_id: &UnitId, started_tx: &TxHash) -> Vec<u8> {
    [unit_id.as_bytes().as_slice(), started_tx.as_bytes().as_slice()].concat()
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(postcard::from_bytes(bytes)?)
}

fn encode<T: serde::Serialize>(value: &T) -> ConflictableTransactionResult<Vec<u8>, StoreError> {
    postcard::to_allocvec(value).map_err(|e| {
        ConflictableTransactionError::Abort(StoreError::SerializationFailed(e.to_string()))
    })
}

fn decode_in_tx<T: DeserializeOwned>(bytes: &[u8]) -> ConflictableTransactionResult<T, StoreError> {
    postcard::from_bytes(bytes).map_err(|e| {
        ConflictableTransactionError::Abort(StoreError::DeserializationFailed(e.to_string()))
    })
}

/// The trees as seen from inside one transaction
struct TxView<'a> {
    units: &'a TransactionalTree,
    owner_units: &'a TransactionalTree,
    deposits: &'a TransactionalTree,
    spends: &'a TransactionalTree,
    spend_outputs: &'a TransactionalTree,
    merges: &'a TransactionalTree,
    withdrawals: &'a TransactionalTree,
    meta: &'a TransactionalTree,
}

impl TxView<'_> {
    fn apply(&self, batch: &WriteBatch) -> ConflictableTransactionResult<BatchReceipt, StoreError> {
        let mut receipt = BatchReceipt::default();
        for statement in batch.statements() {
            match statement {
                Statement::InsertDeposit(deposit) => self.insert_deposit(deposit)?,
                Statement::CreateUnit(unit) => self.create_unit(unit)?,
                Statement::MarkDeleted { id, expect_live } => self.mark_deleted(id, *expect_live)?,
                Statement::MarkWithdrawn(id) => self.mark_withdrawn(id)?,
                Statement::AppendSpend(spend) => receipt.spend_seqs.push(self.append_spend(spend)?),
                Statement::AppendMerge(merge) => {
                    self.merges.insert(merge.new_id.as_bytes().as_slice(), encode(merge)?)?;
                }
                Statement::AppendWithdrawal(withdrawal) => self.append_withdrawal(withdrawal)?,
            }
        }
        Ok(receipt)
    }

    fn insert_deposit(&self, deposit: &DepositRecord) -> ConflictableTransactionResult<(), StoreError> {
        let key = deposit.tx_hash.as_bytes();
        if self.deposits.get(key)?.is_some() {
            return abort(StoreError::DuplicateDeposit(deposit.tx_hash));
        }
        self.deposits.insert(key.as_slice(), encode(deposit)?)?;
        Ok(())
    }

    fn append_withdrawal(&self, withdrawal: &WithdrawalRecord) -> ConflictableTransactionResult<(), StoreError> {
        let key = withdrawal_key(&withdrawal.unit_id, &withdrawal.started_tx);
        if self.withdrawals.get(key.as_slice())?.is_some() {
            return abort(StoreError::DuplicateWithdrawal {
                unit: withdrawal.unit_id,
                tx: withdrawal.started_tx,
            });
        }
        self.withdrawals.insert(key, encode(withdrawal)?)?;
        Ok(())
    }

    fn create_unit(&self, unit: &Unit) -> ConflictableTransactionResult<(), StoreError> {
        let key = unit.id().as_bytes();
        if self.units.get(key)?.is_some() {
            return abort(StoreError::DuplicateUnit(*unit.id()));
        }
        self.units.insert(key.as_slice(), encode(unit)?)?;
        self.owner_units.insert(owner_key(unit.owner(), unit.id()), Vec::<u8>::new())?;
        Ok(())
    }

    fn load_unit(&self, id: &UnitId) -> ConflictableTransactionResult<Unit, StoreError> {
        match self.units.get(id.as_bytes())? {
            Some(bytes) => decode_in_tx(&bytes),
            None => abort(StoreError::UnitNotFound(*id)),
        }
    }

    fn mark_deleted(&self, id: &UnitId, expect_live: bool) -> ConflictableTransactionResult<(), StoreError> {
        let mut unit = self.load_unit(id)?;
        if unit.is_deleted() {
            if expect_live {
                return abort(StoreError::UnitAlreadyDeleted(*id));
            }
            return Ok(());
        }
        unit.mark_deleted();
        self.units.insert(id.as_bytes().as_slice(), encode(&unit)?)?;
        Ok(())
    }

    fn mark_withdrawn(&self, id: &UnitId) -> ConflictableTransactionResult<(), StoreError> {
        let mut unit = self.load_unit(id)?;
        unit.mark_withdrawn();
        self.units.insert(id.as_bytes().as_slice(), encode(&unit)?)?;
        Ok(())
    }

    fn append_spend(&self, spend: &SpendRecord) -> ConflictableTransactionResult<u64, StoreError> {
        let last = match self.meta.get(SPEND_SEQ_KEY)? {
            Some(bytes) => decode_seq(&bytes).map_err(ConflictableTransactionError::Abort)?,
            None => 0,
        };
        let seq = last + 1;
        self.meta.insert(SPEND_SEQ_KEY, seq_key(seq).to_vec())?;

        let record = spend.clone().with_seq(seq);
        self.spends.insert(seq_key(seq).to_vec(), encode(&record)?)?;
        for output in record.outputs() {
            self.spend_outputs.insert(output.as_bytes().as_slice(), seq_key(seq).to_vec())?;
        }
        Ok(seq)
    }
}

/// Persistent ledger store backed by sled.
///
/// Opening the store provisions every tree it needs.
pub struct SledStore {
    db: sled::Db,
    units: sled::Tree,
    owner_units: sled::Tree,
    deposits: sled::Tree,
    spends: sled::Tree,
    spend_outputs: sled::Tree,
    merges: sled::Tree,
    withdrawals: sled::Tree,
    meta: sled::Tree,
    flush_on_commit: bool,
}

impl SledStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with(&StoreConfig::new(path.as_ref()))
    }

    /// Open with explicit settings
    pub fn open_with(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut sled_config = sled::Config::new()
            .path(&config.path)
            .temporary(config.temporary);
        if let Some(bytes) = config.cache_capacity_bytes {
            sled_config = sled_config.cache_capacity(bytes);
        }
        let db = sled_config
            .open()
            .map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Self::from_db(db, config.flush_on_commit)
    }

    fn from_db(db: sled::Db, flush_on_commit: bool) -> Result<Self, StoreError> {
        let open = |name: &str| db.open_tree(name).map_err(|e| StoreError::OpenFailed(e.to_string()));
        let units = open(trees::UNITS)?;
        let owner_units = open(trees::OWNER_UNITS)?;
        let deposits = open(trees::DEPOSITS)?;
        let spends = open(trees::SPENDS)?;
        let spend_outputs = open(trees::SPEND_OUTPUTS)?;
        let merges = open(trees::MERGES)?;
        let withdrawals = open(trees::WITHDRAWALS)?;
        let meta = open(trees::META)?;
        Ok(Self {
            db,
            units,
            owner_units,
            deposits,
            spends,
            spend_outputs,
            merges,
            withdrawals,
            meta,
            flush_on_commit,
        })
    }

    /// Check if the store holds no units
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }
}

impl LedgerStore for SledStore {
    fn execute(&self, batch: &WriteBatch) -> Result<BatchReceipt, StoreError> {
        let trees = (
            &self.units,
            &self.owner_units,
            &self.deposits,
            &self.spends,
            &self.spend_outputs,
            &self.merges,
            &self.withdrawals,
            &self.meta,
        );
        let receipt = trees
            .transaction(
                |(units, owner_units, deposits, spends, spend_outputs, merges, withdrawals, meta)| {
                    TxView {
                        units,
                        owner_units,
                        deposits,
                        spends,
                        spend_outputs,
                        merges,
                        withdrawals,
                        meta,
                    }
                    .apply(batch)
                },
            )
            .map_err(|e| match e {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => StoreError::from(err),
            })?;

        debug!(statements = batch.len(), spends = receipt.spend_seqs.len(), "batch committed");
        if self.flush_on_commit {
            self.flush()?;
        }
        Ok(receipt)
    }

    fn get_unit(&self, id: &UnitId) -> Result<Option<Unit>, StoreError> {
        match self.units.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn units_by_owner(&self, owner: &Address) -> Result<Vec<Unit>, StoreError> {
        let mut units = Vec::new();
        for entry in self.owner_units.scan_prefix(owner.as_bytes()) {
            let (key, _) = entry?;
            let id_bytes: [u8; 32] = key[Address::LEN..]
                .try_into()
                .map_err(|_| StoreError::DeserializationFailed("Invalid owner index key".into()))?;
            if let Some(unit) = self.get_unit(&UnitId::from_bytes(id_bytes))? {
                units.push(unit);
            }
        }
        Ok(units)
    }

    fn get_deposit(&self, tx_hash: &TxHash) -> Result<Option<DepositRecord>, StoreError> {
        match self.deposits.get(tx_hash.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn spend_by_output(&self, id: &UnitId) -> Result<Option<SpendRecord>, StoreError> {
        let seq = match self.spend_outputs.get(id.as_bytes())? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        match self.spends.get(seq)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Err(StoreError::DatabaseError(format!(
                "Spend index points at a missing record for {}",
                id
            ))),
        }
    }

    fn spends_in_range(&self, start: u64, end: u64) -> Result<Vec<SpendRecord>, StoreError> {
        let mut spends = Vec::new();
        if start > end {
            return Ok(spends);
        }
        for entry in self.spends.range(seq_key(start)..=seq_key(end)) {
            let (_, bytes) = entry?;
            spends.push(decode(&bytes)?);
        }
        Ok(spends)
    }

    fn last_spend_seq(&self) -> Result<Option<u64>, StoreError> {
        match self.spends.last()? {
            Some((key, _)) => Ok(Some(decode_seq(&key)?)),
            None => Ok(None),
        }
    }

    fn get_merge(&self, new_id: &UnitId) -> Result<Option<MergeRecord>, StoreError> {
        match self.merges.get(new_id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn withdrawals_for(&self, unit_id: &UnitId) -> Result<Vec<WithdrawalRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in self.withdrawals.scan_prefix(unit_id.as_bytes()) {
            let (_, bytes) = entry?;
            records.push(decode(&bytes)?);
        }
        Ok(records)
    }

    fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            units: self.units.len(),
            deposits: self.deposits.len(),
            spends: self.spends.len(),
            merges: self.merges.len(),
            withdrawals: self.withdrawals.len(),
            disk_size_bytes: self.db.size_on_disk()?,
        })
    }
}
