// Provenance Tracer - walks the spend log backward from a unit

use crate::error::LedgerError;
use crate::identity::UnitId;
use crate::ledger::SpendRecord;
use crate::storage::LedgerStore;
use std::sync::Arc;
use tracing::debug;

/// Reconstructs the chain of spends that produced a unit
#[derive(Clone)]
pub struct ProvenanceTracer {
    store: Arc<dyn LedgerStore>,
    max_depth: usize,
}

impl ProvenanceTracer {
    pub fn new(store: Arc<dyn LedgerStore>, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    /// Spends leading to `unit_id`, most recent first.
    ///
    /// The walk stops at the first id no spend produced: a deposit, or a
    /// merge output. The last record's `old_tx` is that root. An empty
    /// result means `unit_id` is itself a root.
    pub fn trace(&self, unit_id: &UnitId) -> Result<Vec<SpendRecord>, LedgerError> {
        let mut chain = Vec::new();
        let mut current = *unit_id;

        while let Some(spend) = self.store.spend_by_output(&current)? {
            if chain.len() == self.max_depth {
                return Err(LedgerError::ProvenanceTooDeep {
                    unit: *unit_id,
                    depth: self.max_depth,
                });
            }
            current = spend.old_tx;
            chain.push(spend);
        }

        debug!(unit = %unit_id, depth = chain.len(), root = %current, "provenance traced");
        Ok(chain)
    }

    /// The root id the walk from `unit_id` ends at
    pub fn root_of(&self, unit_id: &UnitId) -> Result<UnitId, LedgerError> {
        Ok(self
            .trace(unit_id)?
            .last()
            .map(|spend| spend.old_tx)
            .unwrap_or(*unit_id))
    }
}
