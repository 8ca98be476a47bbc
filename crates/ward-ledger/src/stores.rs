//! The three stores a ledger writes to.

use std::path::Path;

use ward_store::{DurableStore, FileStore, MemoryStore, StoreError};

/// Storage for a ledger: log entries, the tree snapshot, and entries moved
/// aside by an archiving rollback.
pub struct LedgerStores {
    pub log: Box<dyn DurableStore>,
    pub state: Box<dyn DurableStore>,
    pub archive: Box<dyn DurableStore>,
}

impl LedgerStores {
    /// Directory layout under `data_dir`: the snapshot in the directory
    /// itself, entries in `log/`, archived entries in `archive/`.
    pub fn on_disk(data_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            log: Box::new(FileStore::new(data_dir.join("log"))?),
            state: Box::new(FileStore::new(data_dir)?),
            archive: Box::new(FileStore::new(data_dir.join("archive"))?),
        })
    }

    /// Volatile stores. Nothing survives the process.
    pub fn in_memory() -> Self {
        Self {
            log: Box::new(MemoryStore::new()),
            state: Box::new(MemoryStore::new()),
            archive: Box::new(MemoryStore::new()),
        }
    }
}
