//! Durable store trait and backend implementations.
//!
//! This crate defines the [`DurableStore`] trait: a flat namespace of named
//! text blobs with a best-effort write-protection flag. Two backends:
//!
//! - [`MemoryStore`]: volatile storage backed by a `RwLock<HashMap>`.
//! - [`FileStore`]: one file per name inside a directory, with the
//!   read-only permission bit as the write-protection flag.
//!
//! Write protection is a deterrent only. Anyone with local access can clear
//! it; tamper evidence comes from the fingerprint chain in the mutation log.

mod error;
mod file_store;
mod memory_store;
mod traits;

pub use error::StoreError;
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use traits::DurableStore;
