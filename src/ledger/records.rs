// Append-only history records: deposits, spends, merges, withdrawals

use crate::identity::{Address, SpendSignature, TxHash, UnitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A root-chain funding event. Seeds exactly one unit whose id is `tx_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub tx_hash: TxHash,
    pub owner: Address,
    pub value: u64,
    pub token_id: String,
    pub chain_id: u64,
    pub created_at: DateTime<Utc>,
}

/// One spend transition: `old_tx` consumed, `new_tx1` (and maybe `new_tx2`) created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendRecord {
    /// Position in the spend log. Assigned by the store on commit; zero
    /// until then.
    pub seq: u64,
    pub old_tx: UnitId,
    pub value: u64,
    pub to_addr: Address,
    pub new_tx1: UnitId,
    /// Change output, absent when the whole unit was transferred
    pub new_tx2: Option<UnitId>,
    pub signature: SpendSignature,
    pub created_at: DateTime<Utc>,
}

impl SpendRecord {
    pub fn new(
        old_tx: UnitId,
        value: u64,
        to_addr: Address,
        new_tx1: UnitId,
        new_tx2: Option<UnitId>,
        signature: SpendSignature,
    ) -> Self {
        Self {
            seq: 0,
            old_tx,
            value,
            to_addr,
            new_tx1,
            new_tx2,
            signature,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    /// Ids this spend created
    pub fn outputs(&self) -> impl Iterator<Item = &UnitId> {
        std::iter::once(&self.new_tx1).chain(self.new_tx2.iter())
    }

    /// Whether `id` is one of this spend's outputs
    pub fn produced(&self, id: &UnitId) -> bool {
        self.outputs().any(|out| out == id)
    }
}

/// Two units of one owner folded into a single unit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    pub id1: UnitId,
    pub id2: UnitId,
    pub new_id: UnitId,
    pub owner: Address,
    pub value: u64,
    pub signature: SpendSignature,
    pub created_at: DateTime<Utc>,
}

/// A withdrawal started on the root chain against a unit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    pub unit_id: UnitId,
    pub started_tx: TxHash,
    pub token_id: String,
    pub chain_id: u64,
    /// Set by the exit finaliser, which lives outside this crate
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}
