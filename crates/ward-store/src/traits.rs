//! Core trait for durable storage.

use std::sync::Arc;

use crate::error::StoreError;

/// A flat namespace of named text blobs.
///
/// Writes must be durable when `write` returns. The immutable flag is
/// best-effort: backends that cannot enforce it record it as well as they can.
pub trait DurableStore: Send + Sync {
    /// All stored names, in no particular order.
    fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Read a blob. Missing names are [`StoreError::NotFound`].
    fn read(&self, name: &str) -> Result<String, StoreError>;

    /// Create or overwrite a blob. Refused with [`StoreError::Immutable`]
    /// while the existing blob is write-protected.
    fn write(&self, name: &str, text: &str) -> Result<(), StoreError>;

    /// Check whether a name exists.
    fn contains(&self, name: &str) -> Result<bool, StoreError>;

    /// Mark a blob write-protected.
    fn set_immutable(&self, name: &str) -> Result<(), StoreError>;

    /// Lift write protection from a blob.
    fn clear_immutable(&self, name: &str) -> Result<(), StoreError>;

    /// Whether a blob is currently write-protected.
    fn is_immutable(&self, name: &str) -> Result<bool, StoreError>;

    /// Delete a blob. Deleting a missing name is not an error; deleting a
    /// write-protected one is.
    fn delete(&self, name: &str) -> Result<(), StoreError>;
}

/// Shared handle to a store, so callers can keep access to a store they hand
/// to a log.
impl<S: DurableStore + ?Sized> DurableStore for Arc<S> {
    fn list(&self) -> Result<Vec<String>, StoreError> {
        (**self).list()
    }

    fn read(&self, name: &str) -> Result<String, StoreError> {
        (**self).read(name)
    }

    fn write(&self, name: &str, text: &str) -> Result<(), StoreError> {
        (**self).write(name, text)
    }

    fn contains(&self, name: &str) -> Result<bool, StoreError> {
        (**self).contains(name)
    }

    fn set_immutable(&self, name: &str) -> Result<(), StoreError> {
        (**self).set_immutable(name)
    }

    fn clear_immutable(&self, name: &str) -> Result<(), StoreError> {
        (**self).clear_immutable(name)
    }

    fn is_immutable(&self, name: &str) -> Result<bool, StoreError> {
        (**self).is_immutable(name)
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        (**self).delete(name)
    }
}
