// Checkpoint Accessor - bounded, ordered reads of the spend log

use crate::error::LedgerError;
use crate::ledger::SpendRecord;
use crate::storage::LedgerStore;
use std::sync::Arc;
use tracing::debug;

/// Parse a textual `[start, end]` window
pub fn parse_window(start: &str, end: &str) -> Result<(u64, u64), LedgerError> {
    let parse = |label: &str, s: &str| {
        s.trim()
            .parse::<u64>()
            .map_err(|_| LedgerError::InvalidRange(format!("{} is not a sequence number: {:?}", label, s)))
    };
    Ok((parse("start", start)?, parse("end", end)?))
}

/// Read-only windows into the spend log for checkpoint assembly
#[derive(Clone)]
pub struct CheckpointAccessor {
    store: Arc<dyn LedgerStore>,
    max_window: u64,
}

impl CheckpointAccessor {
    pub fn new(store: Arc<dyn LedgerStore>, max_window: u64) -> Self {
        Self { store, max_window }
    }

    /// Largest number of records one window returns
    pub fn max_window(&self) -> u64 {
        self.max_window
    }

    /// Spends with `start <= seq <= end`, ascending.
    ///
    /// A window wider than the cap is narrowed to its first `max_window`
    /// sequence numbers rather than rejected.
    pub fn spends_in_range(&self, start: u64, end: u64) -> Result<Vec<SpendRecord>, LedgerError> {
        if start > end {
            return Err(LedgerError::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        let capped_end = end.min(start.saturating_add(self.max_window.max(1) - 1));
        let spends = self.store.spends_in_range(start, capped_end)?;
        debug!(start, end = capped_end, count = spends.len(), "spend window read");
        Ok(spends)
    }

    /// Sequence number of the most recent spend
    pub fn last_spend_seq(&self) -> Result<u64, LedgerError> {
        self.store.last_spend_seq()?.ok_or(LedgerError::NoSpends)
    }
}
