use crate::identity::{Address, SignatureError, UnitId};
use crate::storage::StoreError;
use thiserror::Error;

/// Errors surfaced to ledger callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unit {0} not found")]
    NotFound(UnitId),

    #[error("Unit {0} already exists")]
    DuplicateId(UnitId),

    #[error("Signer {signer} does not own unit {unit} (owner {owner})")]
    UnauthorizedSigner {
        unit: UnitId,
        signer: Address,
        owner: Address,
    },

    #[error("Insufficient value in unit {unit}: available {available}, requested {requested}")]
    InsufficientValue {
        unit: UnitId,
        available: u64,
        requested: u64,
    },

    #[error("Unit {0} already spent")]
    AlreadySpent(UnitId),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("No spends on record")]
    NoSpends,

    #[error("Transfer and change outputs of the spend would share id {0}")]
    OutputCollision(UnitId),

    #[error("Cannot merge unit {0} with itself")]
    SameUnit(UnitId),

    #[error("Value would overflow")]
    ValueOverflow,

    #[error("Provenance of {unit} exceeds {depth} steps")]
    ProvenanceTooDeep { unit: UnitId, depth: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Store failure: {0}")]
    StoreFailure(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUnit(id) | StoreError::DuplicateDeposit(id) => LedgerError::DuplicateId(id),
            StoreError::DuplicateWithdrawal { unit, .. } => LedgerError::DuplicateId(unit),
            StoreError::UnitNotFound(id) => LedgerError::NotFound(id),
            StoreError::UnitAlreadyDeleted(id) => LedgerError::AlreadySpent(id),
            other => LedgerError::StoreFailure(other.to_string()),
        }
    }
}

impl From<SignatureError> for LedgerError {
    fn from(err: SignatureError) -> Self {
        LedgerError::InvalidSignature(err.to_string())
    }
}
