//! Error types for the ledger.

use ward_types::PatientId;

/// Errors that can occur during ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A record with this id already exists.
    #[error("patient {0} already exists")]
    DuplicateKey(PatientId),

    /// No record with this id exists.
    #[error("patient {0} not found")]
    NotFound(PatientId),

    /// A disease entry is empty text, which a record line cannot carry.
    #[error("patient {0} has an empty disease entry")]
    EmptyDisease(PatientId),

    /// Purge was requested without confirmation.
    #[error("purge not confirmed")]
    PurgeNotConfirmed,

    /// Mutation log error, including failed verification.
    #[error("log error: {0}")]
    Log(#[from] ward_log::LogError),

    /// Storage backend error.
    #[error("store error: {0}")]
    Store(#[from] ward_store::StoreError),
}
