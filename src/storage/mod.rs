// Storage module - PERSISTENCE
// Store adapter contract plus sled-backed and in-memory implementations

mod memory;
mod sled_store;
mod store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;
pub use store::{BatchReceipt, LedgerStore, Statement, StorageStats, StoreError, WriteBatch};
