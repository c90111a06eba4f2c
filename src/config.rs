// Ledger and store configuration

use crate::error::LedgerError;
use std::path::{Path, PathBuf};

/// Default cap on records returned by one checkpoint window
pub const DEFAULT_CHECKPOINT_WINDOW: u64 = 1000;

/// Default guard on provenance walk length
pub const DEFAULT_PROVENANCE_DEPTH: usize = 100_000;

/// Configuration for the ledger engine
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Maximum number of spend records in one checkpoint window
    pub max_checkpoint_window: u64,
    /// Maximum number of spends a provenance walk will follow
    pub max_provenance_depth: usize,
}

impl LedgerConfig {
    /// Create a new config with builder pattern
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the checkpoint window cap
    pub fn with_max_checkpoint_window(mut self, records: u64) -> Self {
        self.max_checkpoint_window = records;
        self
    }

    /// Set the provenance depth guard
    pub fn with_max_provenance_depth(mut self, depth: usize) -> Self {
        self.max_provenance_depth = depth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.max_checkpoint_window == 0 {
            return Err(LedgerError::InvalidConfig(
                "max_checkpoint_window must be >= 1".to_string(),
            ));
        }
        if self.max_provenance_depth == 0 {
            return Err(LedgerError::InvalidConfig(
                "max_provenance_depth must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_checkpoint_window: DEFAULT_CHECKPOINT_WINDOW,
            max_provenance_depth: DEFAULT_PROVENANCE_DEPTH,
        }
    }
}

/// Settings for opening a sled-backed store
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Delete the database when the store is dropped
    pub temporary: bool,
    /// Flush to disk after every committed batch
    pub flush_on_commit: bool,
    /// Page cache size; sled's default when unset
    pub cache_capacity_bytes: Option<u64>,
}

impl StoreConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            temporary: false,
            flush_on_commit: false,
            cache_capacity_bytes: None,
        }
    }

    pub fn with_temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn with_flush_on_commit(mut self, flush: bool) -> Self {
        self.flush_on_commit = flush;
        self
    }

    pub fn with_cache_capacity_bytes(mut self, bytes: u64) -> Self {
        self.cache_capacity_bytes = Some(bytes);
        self
    }
}
