// MemoryStore - in-process ledger storage
//
// Same contract as SledStore. Statements are applied in place while an undo
// journal records what each one replaced; a failing statement rolls the
// journal back, so a batch costs time proportional to its own size.

use crate::identity::{Address, TxHash, UnitId};
use crate::ledger::{DepositRecord, MergeRecord, SpendRecord, Unit, WithdrawalRecord};
use crate::storage::store::{
    BatchReceipt, LedgerStore, Statement, StorageStats, StoreError, WriteBatch,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Inverse of one applied statement
enum Undo {
    Deposit(TxHash),
    Unit(UnitId, Option<Unit>),
    Spend { seq: u64, outputs: Vec<(UnitId, Option<u64>)> },
    Merge(UnitId, Option<MergeRecord>),
    Withdrawal(UnitId, TxHash),
}

#[derive(Debug, Default)]
struct Tables {
    units: HashMap<UnitId, Unit>,
    deposits: HashMap<TxHash, DepositRecord>,
    spends: BTreeMap<u64, SpendRecord>,
    spend_outputs: HashMap<UnitId, u64>,
    merges: HashMap<UnitId, MergeRecord>,
    withdrawals: BTreeMap<(UnitId, TxHash), WithdrawalRecord>,
    last_seq: u64,
}

impl Tables {
    fn apply(
        &mut self,
        statement: &Statement,
        receipt: &mut BatchReceipt,
        journal: &mut Vec<Undo>,
    ) -> Result<(), StoreError> {
        match statement {
            Statement::InsertDeposit(deposit) => {
                if self.deposits.contains_key(&deposit.tx_hash) {
                    return Err(StoreError::DuplicateDeposit(deposit.tx_hash));
                }
                self.deposits.insert(deposit.tx_hash, deposit.clone());
                journal.push(Undo::Deposit(deposit.tx_hash));
            }
            Statement::CreateUnit(unit) => {
                if self.units.contains_key(unit.id()) {
                    return Err(StoreError::DuplicateUnit(*unit.id()));
                }
                self.units.insert(*unit.id(), unit.clone());
                journal.push(Undo::Unit(*unit.id(), None));
            }
            Statement::MarkDeleted { id, expect_live } => {
                let unit = self.units.get_mut(id).ok_or(StoreError::UnitNotFound(*id))?;
                if unit.is_deleted() && *expect_live {
                    return Err(StoreError::UnitAlreadyDeleted(*id));
                }
                journal.push(Undo::Unit(*id, Some(unit.clone())));
                unit.mark_deleted();
            }
            Statement::MarkWithdrawn(id) => {
                let unit = self.units.get_mut(id).ok_or(StoreError::UnitNotFound(*id))?;
                journal.push(Undo::Unit(*id, Some(unit.clone())));
                unit.mark_withdrawn();
            }
            Statement::AppendSpend(spend) => {
                let seq = self.last_seq + 1;
                let record = spend.clone().with_seq(seq);
                let outputs = record
                    .outputs()
                    .map(|output| (*output, self.spend_outputs.insert(*output, seq)))
                    .collect();
                self.spends.insert(seq, record);
                self.last_seq = seq;
                journal.push(Undo::Spend { seq, outputs });
                receipt.spend_seqs.push(seq);
            }
            Statement::AppendMerge(merge) => {
                let previous = self.merges.insert(merge.new_id, merge.clone());
                journal.push(Undo::Merge(merge.new_id, previous));
            }
            Statement::AppendWithdrawal(withdrawal) => {
                let key = (withdrawal.unit_id, withdrawal.started_tx);
                if self.withdrawals.contains_key(&key) {
                    return Err(StoreError::DuplicateWithdrawal {
                        unit: withdrawal.unit_id,
                        tx: withdrawal.started_tx,
                    });
                }
                self.withdrawals.insert(key, withdrawal.clone());
                journal.push(Undo::Withdrawal(key.0, key.1));
            }
        }
        Ok(())
    }

    fn rollback(&mut self, journal: Vec<Undo>) {
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Deposit(tx_hash) => {
                    self.deposits.remove(&tx_hash);
                }
                Undo::Unit(id, Some(previous)) => {
                    self.units.insert(id, previous);
                }
                Undo::Unit(id, None) => {
                    self.units.remove(&id);
                }
                Undo::Spend { seq, outputs } => {
                    self.spends.remove(&seq);
                    self.last_seq = seq - 1;
                    for (output, previous) in outputs {
                        match previous {
                            Some(prev_seq) => self.spend_outputs.insert(output, prev_seq),
                            None => self.spend_outputs.remove(&output),
                        };
                    }
                }
                Undo::Merge(id, Some(previous)) => {
                    self.merges.insert(id, previous);
                }
                Undo::Merge(id, None) => {
                    self.merges.remove(&id);
                }
                Undo::Withdrawal(unit_id, tx) => {
                    self.withdrawals.remove(&(unit_id, tx));
                }
            }
        }
    }
}

/// Ledger store held entirely in memory. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::DatabaseError("Memory store lock poisoned".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn execute(&self, batch: &WriteBatch) -> Result<BatchReceipt, StoreError> {
        let mut tables = self.lock()?;
        let mut receipt = BatchReceipt::default();
        let mut journal = Vec::with_capacity(batch.len());
        for statement in batch.statements() {
            if let Err(err) = tables.apply(statement, &mut receipt, &mut journal) {
                tables.rollback(journal);
                return Err(err);
            }
        }
        Ok(receipt)
    }

    fn get_unit(&self, id: &UnitId) -> Result<Option<Unit>, StoreError> {
        Ok(self.lock()?.units.get(id).cloned())
    }

    fn units_by_owner(&self, owner: &Address) -> Result<Vec<Unit>, StoreError> {
        let tables = self.lock()?;
        let mut units: Vec<Unit> = tables
            .units
            .values()
            .filter(|u| u.owner() == owner)
            .cloned()
            .collect();
        units.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(units)
    }

    fn get_deposit(&self, tx_hash: &TxHash) -> Result<Option<DepositRecord>, StoreError> {
        Ok(self.lock()?.deposits.get(tx_hash).cloned())
    }

    fn spend_by_output(&self, id: &UnitId) -> Result<Option<SpendRecord>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .spend_outputs
            .get(id)
            .and_then(|seq| tables.spends.get(seq))
            .cloned())
    }

    fn spends_in_range(&self, start: u64, end: u64) -> Result<Vec<SpendRecord>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self.lock()?.spends.range(start..=end).map(|(_, s)| s.clone()).collect())
    }

    fn last_spend_seq(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.lock()?.spends.keys().next_back().copied())
    }

    fn get_merge(&self, new_id: &UnitId) -> Result<Option<MergeRecord>, StoreError> {
        Ok(self.lock()?.merges.get(new_id).cloned())
    }

    fn withdrawals_for(&self, unit_id: &UnitId) -> Result<Vec<WithdrawalRecord>, StoreError> {
        Ok(self
            .lock()?
            .withdrawals
            .range((*unit_id, TxHash::from_bytes([0; 32]))..=(*unit_id, TxHash::from_bytes([0xff; 32])))
            .map(|(_, w)| w.clone())
            .collect())
    }

    fn stats(&self) -> Result<StorageStats, StoreError> {
        let tables = self.lock()?;
        Ok(StorageStats {
            units: tables.units.len(),
            deposits: tables.deposits.len(),
            spends: tables.spends.len(),
            merges: tables.merges.len(),
            withdrawals: tables.withdrawals.len(),
            disk_size_bytes: 0,
        })
    }
}
