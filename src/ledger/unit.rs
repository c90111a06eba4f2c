// Unit (UTXO) - a spendable value record

use crate::identity::{Address, UnitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unit of value held by one address.
///
/// Units are never removed. Consumption sets `deleted`; a root-chain exit
/// sets `withdrawn`. The two flags are independent and only `deleted`
/// decides spendability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    owner: Address,
    value: u64,
    token_id: String,
    chain_id: u64,
    deleted: bool,
    withdrawn: bool,
    created_at: DateTime<Utc>,
}

impl Unit {
    /// Create a fresh, spendable unit
    pub fn new(id: UnitId, owner: Address, value: u64, token_id: impl Into<String>, chain_id: u64) -> Self {
        Self {
            id,
            owner,
            value,
            token_id: token_id.into(),
            chain_id,
            deleted: false,
            withdrawn: false,
            created_at: Utc::now(),
        }
    }

    /// A successor unit carrying the same asset classifiers as `self`
    pub fn successor(&self, id: UnitId, owner: Address, value: u64) -> Self {
        Self::new(id, owner, value, self.token_id.clone(), self.chain_id)
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_withdrawn(&self) -> bool {
        self.withdrawn
    }

    /// A unit is spendable until a spend or merge consumes it
    pub fn is_spendable(&self) -> bool {
        !self.deleted
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub(crate) fn mark_withdrawn(&mut self) {
        self.withdrawn = true;
    }
}
