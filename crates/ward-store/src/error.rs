//! Error types for durable store operations.

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested name was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The name is write-protected; clear the flag before overwriting or deleting.
    #[error("write-protected: {0}")]
    Immutable(String),

    /// The name cannot be used as a file name in this store.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
