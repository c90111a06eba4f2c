// Store adapter contract
//
// The engine never talks to a database directly. It hands an ordered batch
// of statements to `execute`, which must commit all of them or none, and
// reads back through the typed queries below.

use crate::identity::{Address, TxHash, UnitId};
use crate::ledger::{DepositRecord, MergeRecord, SpendRecord, Unit, WithdrawalRecord};
use thiserror::Error;

/// Errors from storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),

    #[error("Unit {0} already exists")]
    DuplicateUnit(UnitId),

    #[error("Deposit {0} already recorded")]
    DuplicateDeposit(TxHash),

    #[error("Withdrawal of unit {unit} in transaction {tx} already recorded")]
    DuplicateWithdrawal { unit: UnitId, tx: TxHash },

    #[error("Unit {0} not found")]
    UnitNotFound(UnitId),

    #[error("Unit {0} is already deleted")]
    UnitAlreadyDeleted(UnitId),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

impl From<postcard::Error> for StoreError {
    fn from(err: postcard::Error) -> Self {
        StoreError::DeserializationFailed(err.to_string())
    }
}

/// One write inside an atomic batch
#[derive(Clone, Debug)]
pub enum Statement {
    /// Append a deposit; rejected if the transaction was already recorded
    InsertDeposit(DepositRecord),
    /// Insert a unit; rejected if the id exists
    CreateUnit(Unit),
    /// Tombstone a unit. With `expect_live` an already deleted unit rejects
    /// the whole batch instead of being a no-op.
    MarkDeleted { id: UnitId, expect_live: bool },
    /// Flag a unit as withdrawn
    MarkWithdrawn(UnitId),
    /// Append a spend; the store assigns its sequence number
    AppendSpend(SpendRecord),
    AppendMerge(MergeRecord),
    /// Append a withdrawal; rejected if the same (unit, transaction) pair
    /// was already recorded
    AppendWithdrawal(WithdrawalRecord),
}

/// Ordered statements committed all-or-nothing
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    statements: Vec<Statement>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement (builder style)
    pub fn with(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// What a committed batch produced
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReceipt {
    /// Sequence numbers given to `AppendSpend` statements, in batch order
    pub spend_seqs: Vec<u64>,
}

/// Record counts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub units: usize,
    pub deposits: usize,
    pub spends: usize,
    pub merges: usize,
    pub withdrawals: usize,
    /// Approximate disk size in bytes (zero for in-memory stores)
    pub disk_size_bytes: u64,
}

/// Transactional record store the ledger runs on.
///
/// Implementations must give `execute` all-or-nothing semantics and must
/// enforce the unit-id uniqueness and `expect_live` checks inside the same
/// atomic step, so that two racing batches cannot both succeed.
pub trait LedgerStore: Send + Sync {
    /// Commit a batch atomically
    fn execute(&self, batch: &WriteBatch) -> Result<BatchReceipt, StoreError>;

    fn get_unit(&self, id: &UnitId) -> Result<Option<Unit>, StoreError>;

    /// Every unit ever owned by `owner`, deleted ones included
    fn units_by_owner(&self, owner: &Address) -> Result<Vec<Unit>, StoreError>;

    fn get_deposit(&self, tx_hash: &TxHash) -> Result<Option<DepositRecord>, StoreError>;

    /// The spend whose `new_tx1` or `new_tx2` is `id`
    fn spend_by_output(&self, id: &UnitId) -> Result<Option<SpendRecord>, StoreError>;

    /// Spends with `start <= seq <= end`, ascending
    fn spends_in_range(&self, start: u64, end: u64) -> Result<Vec<SpendRecord>, StoreError>;

    fn last_spend_seq(&self) -> Result<Option<u64>, StoreError>;

    /// The merge that produced `new_id`
    fn get_merge(&self, new_id: &UnitId) -> Result<Option<MergeRecord>, StoreError>;

    fn withdrawals_for(&self, unit_id: &UnitId) -> Result<Vec<WithdrawalRecord>, StoreError>;

    fn stats(&self) -> Result<StorageStats, StoreError>;
}
