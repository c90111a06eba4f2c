// Unit ledger tests
// Existence, uniqueness and flag updates over the store

use plasma_ledger::identity::{Address, Hash256};
use plasma_ledger::ledger::{Unit, UnitLedger};
use plasma_ledger::storage::MemoryStore;
use plasma_ledger::LedgerError;
use std::sync::Arc;

fn ledger() -> UnitLedger {
    UnitLedger::new(Arc::new(MemoryStore::new()))
}

fn unit(id: u8, owner: u8, value: u64) -> Unit {
    Unit::new(Hash256::from_bytes([id; 32]), Address::from_bytes([owner; 20]), value, "", 0)
}

// ============================================================================
// CREATE AND GET
// ============================================================================

#[test]
fn test_create_then_get() {
    let ledger = ledger();
    ledger.create(unit(1, 1, 10)).unwrap();

    let loaded = ledger.get(&Hash256::from_bytes([1; 32])).unwrap();
    assert_eq!(loaded.value(), 10);
    assert!(loaded.is_spendable());
    assert!(!loaded.is_withdrawn());
}

#[test]
fn test_get_missing_is_not_found() {
    let ledger = ledger();
    let id = Hash256::from_bytes([9; 32]);

    assert_eq!(ledger.get(&id).unwrap_err(), LedgerError::NotFound(id));
    assert!(ledger.find(&id).unwrap().is_none());
}

#[test]
fn test_create_duplicate_rejected() {
    let ledger = ledger();
    ledger.create(unit(1, 1, 10)).unwrap();

    let result = ledger.create(unit(1, 2, 99));
    assert_eq!(result.unwrap_err(), LedgerError::DuplicateId(Hash256::from_bytes([1; 32])));

    // Original survives
    let loaded = ledger.get(&Hash256::from_bytes([1; 32])).unwrap();
    assert_eq!(loaded.owner(), &Address::from_bytes([1; 20]));
}

// ============================================================================
// FLAGS
// ============================================================================

#[test]
fn test_mark_deleted_is_idempotent() {
    let ledger = ledger();
    let id = Hash256::from_bytes([1; 32]);
    ledger.create(unit(1, 1, 10)).unwrap();

    ledger.mark_deleted(&id).unwrap();
    ledger.mark_deleted(&id).unwrap();

    assert!(ledger.get(&id).unwrap().is_deleted());
}

#[test]
fn test_mark_missing_is_not_found() {
    let ledger = ledger();
    let id = Hash256::from_bytes([5; 32]);

    assert_eq!(ledger.mark_deleted(&id).unwrap_err(), LedgerError::NotFound(id));
    assert_eq!(ledger.mark_withdrawn(&id).unwrap_err(), LedgerError::NotFound(id));
}

#[test]
fn test_withdrawn_unit_stays_spendable() {
    let ledger = ledger();
    let id = Hash256::from_bytes([1; 32]);
    ledger.create(unit(1, 1, 10)).unwrap();

    ledger.mark_withdrawn(&id).unwrap();

    let loaded = ledger.get(&id).unwrap();
    assert!(loaded.is_withdrawn());
    assert!(loaded.is_spendable());
}

// ============================================================================
// OWNER QUERIES
// ============================================================================

#[test]
fn test_list_by_owner_skips_deleted_and_others() {
    let ledger = ledger();
    ledger.create(unit(1, 1, 10)).unwrap();
    ledger.create(unit(2, 1, 20)).unwrap();
    ledger.create(unit(3, 2, 30)).unwrap();
    ledger.mark_deleted(&Hash256::from_bytes([1; 32])).unwrap();

    let owned = ledger.list_by_owner(&Address::from_bytes([1; 20])).unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].value(), 20);
}

#[test]
fn test_balance_of_sums_spendable() {
    let ledger = ledger();
    ledger.create(unit(1, 1, 10)).unwrap();
    ledger.create(unit(2, 1, 20)).unwrap();

    assert_eq!(ledger.balance_of(&Address::from_bytes([1; 20])).unwrap(), 30);
    assert_eq!(ledger.balance_of(&Address::from_bytes([7; 20])).unwrap(), 0);
}
