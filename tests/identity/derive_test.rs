// Identity derivation tests
// Unit ids are Keccak-256 over parent || recipient || 32-byte value

use plasma_ledger::identity::derive::{keccak256, value_field};
use plasma_ledger::identity::{
    derive_id, derive_merge_id, merge_message, spend_message, Address, Hash256,
};

fn id(byte: u8) -> Hash256 {
    Hash256::from_bytes([byte; 32])
}

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

// ============================================================================
// DETERMINISM
// ============================================================================

#[test]
fn test_same_inputs_same_id() {
    assert_eq!(derive_id(&id(1), &addr(2), 10), derive_id(&id(1), &addr(2), 10));
}

#[test]
fn test_each_input_changes_id() {
    let base = derive_id(&id(1), &addr(2), 10);

    assert_ne!(base, derive_id(&id(9), &addr(2), 10));
    assert_ne!(base, derive_id(&id(1), &addr(9), 10));
    assert_ne!(base, derive_id(&id(1), &addr(2), 11));
}

#[test]
fn test_id_never_equals_parent() {
    let parent = id(1);
    assert_ne!(derive_id(&parent, &addr(2), 0), parent);
}

// ============================================================================
// PREIMAGE LAYOUT
// ============================================================================

#[test]
fn test_preimage_is_parent_recipient_value() {
    let parent = id(0xaa);
    let to = addr(0xbb);

    let mut preimage = Vec::new();
    preimage.extend_from_slice(parent.as_bytes());
    preimage.extend_from_slice(to.as_bytes());
    preimage.extend_from_slice(&value_field(0x1234));
    assert_eq!(preimage.len(), 84);

    assert_eq!(derive_id(&parent, &to, 0x1234), keccak256(&[&preimage]));
}

#[test]
fn test_value_field_big_endian() {
    let field = value_field(u64::MAX);
    assert!(field[..24].iter().all(|b| *b == 0));
    assert!(field[24..].iter().all(|b| *b == 0xff));
}

#[test]
fn test_spend_message_is_transfer_output_id() {
    assert_eq!(spend_message(&id(1), &addr(2), 3), derive_id(&id(1), &addr(2), 3));
}

// ============================================================================
// MERGE IDS
// ============================================================================

#[test]
fn test_merge_id_depends_on_order_owner_and_total() {
    let base = derive_merge_id(&id(1), &id(2), &addr(3), 8);

    assert_ne!(base, derive_merge_id(&id(2), &id(1), &addr(3), 8));
    assert_ne!(base, derive_merge_id(&id(1), &id(2), &addr(4), 8));
    assert_ne!(base, derive_merge_id(&id(1), &id(2), &addr(3), 9));
}

#[test]
fn test_merge_message_differs_from_merge_id() {
    assert_ne!(merge_message(&id(1), &id(2)), derive_merge_id(&id(1), &id(2), &addr(3), 8));
}
