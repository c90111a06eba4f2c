//! Child-chain UTXO ledger engine.
//!
//! Tracks spendable units seeded by root-chain deposits, authorizes their
//! transfer by secp256k1 signature, derives output ids deterministically and
//! reconstructs the spend history of any unit.

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod identity;
pub mod ledger;
pub mod storage;

pub use config::{LedgerConfig, StoreConfig};
pub use engine::{DepositRequest, MergeOutcome, SpendOutcome, TransitionEngine};
pub use error::LedgerError;
