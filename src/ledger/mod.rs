// Ledger module - THE UNITS
// Unit state, append-only history records, and the unit ledger

mod records;
mod unit;
mod unit_ledger;

pub use records::{DepositRecord, MergeRecord, SpendRecord, WithdrawalRecord};
pub use unit::Unit;
pub use unit_ledger::UnitLedger;
