//! In-memory durable store backend.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::StoreError;
use crate::traits::DurableStore;

#[derive(Debug, Clone)]
struct Blob {
    text: String,
    immutable: bool,
}

/// In-memory store backed by a `RwLock<HashMap>`.
///
/// Useful for tests and for ledgers run with `--memory`. Nothing survives
/// the process.
#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, Blob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a blob regardless of its write protection, simulating
    /// out-of-band tampering (for tests).
    pub fn tamper(&self, name: &str, text: &str) {
        let mut map = self.blobs.write().expect("lock poisoned");
        if let Some(blob) = map.get_mut(name) {
            blob.text = text.to_string();
        }
    }
}

impl DurableStore for MemoryStore {
    fn list(&self) -> Result<Vec<String>, StoreError> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<String, StoreError> {
        let map = self.blobs.read().expect("lock poisoned");
        map.get(name)
            .map(|b| b.text.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn write(&self, name: &str, text: &str) -> Result<(), StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let mut map = self.blobs.write().expect("lock poisoned");
        if map.get(name).is_some_and(|b| b.immutable) {
            return Err(StoreError::Immutable(name.to_string()));
        }
        debug!(name, size = text.len(), "storing blob in memory");
        map.insert(
            name.to_string(),
            Blob {
                text: text.to_string(),
                immutable: false,
            },
        );
        Ok(())
    }

    fn contains(&self, name: &str) -> Result<bool, StoreError> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(name))
    }

    fn set_immutable(&self, name: &str) -> Result<(), StoreError> {
        let mut map = self.blobs.write().expect("lock poisoned");
        let blob = map
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        blob.immutable = true;
        Ok(())
    }

    fn clear_immutable(&self, name: &str) -> Result<(), StoreError> {
        let mut map = self.blobs.write().expect("lock poisoned");
        let blob = map
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        blob.immutable = false;
        Ok(())
    }

    fn is_immutable(&self, name: &str) -> Result<bool, StoreError> {
        let map = self.blobs.read().expect("lock poisoned");
        map.get(name)
            .map(|b| b.immutable)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut map = self.blobs.write().expect("lock poisoned");
        match map.get(name) {
            None => Ok(()),
            Some(b) if b.immutable => Err(StoreError::Immutable(name.to_string())),
            Some(_) => {
                map.remove(name);
                debug!(name, "deleted blob from memory");
                Ok(())
            }
        }
    }
}
