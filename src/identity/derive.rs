// Deterministic unit identity derivation
//
// Every id is Keccak-256 over fixed-width fields, so identical inputs give
// identical ids and a replayed transition collides instead of duplicating.

use crate::identity::{Address, Hash256, UnitId};
use sha3::{Digest, Keccak256};

/// Width of the big-endian value field in every preimage
pub const VALUE_FIELD_LEN: usize = 32;

/// Keccak-256 over the concatenation of `parts`
pub fn keccak256(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Hash256::from_bytes(out)
}

/// Encode a value as a 32-byte big-endian field, left-padded with zeros
pub fn value_field(value: u64) -> [u8; VALUE_FIELD_LEN] {
    let mut field = [0u8; VALUE_FIELD_LEN];
    field[VALUE_FIELD_LEN - 8..].copy_from_slice(&value.to_be_bytes());
    field
}

/// Id of the unit produced when `value` moves from `parent` to `recipient`.
///
/// Preimage: `parent[32] || recipient[20] || value[32]`.
pub fn derive_id(parent: &UnitId, recipient: &Address, value: u64) -> UnitId {
    keccak256(&[parent.as_bytes(), recipient.as_bytes(), &value_field(value)])
}

/// The message a unit owner signs to authorize a spend.
///
/// This is the same preimage as [`derive_id`], so the signed hash is the
/// transfer output id itself.
pub fn spend_message(unit_id: &UnitId, recipient: &Address, value: u64) -> Hash256 {
    derive_id(unit_id, recipient, value)
}

/// The message a unit owner signs to authorize merging `id1` and `id2`
pub fn merge_message(id1: &UnitId, id2: &UnitId) -> Hash256 {
    keccak256(&[id1.as_bytes(), id2.as_bytes()])
}

/// Id of the unit produced by merging `id1` and `id2` into `owner`.
///
/// Preimage: `id1[32] || id2[32] || owner[20] || total[32]`.
pub fn derive_merge_id(id1: &UnitId, id2: &UnitId, owner: &Address, total: u64) -> UnitId {
    keccak256(&[
        id1.as_bytes(),
        id2.as_bytes(),
        owner.as_bytes(),
        &value_field(total),
    ])
}
