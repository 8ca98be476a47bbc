//! The patient ledger, tying the tree, the mutation log and the stores
//! together.
//!
//! A [`Ledger`] owns the live [`PatientTree`](ward_tree::PatientTree), writes
//! a log entry for every change, keeps the level-order snapshot of the tree
//! on disk, and exposes audit, step-through browsing, rollback and purge.

pub mod error;
pub mod ledger;
pub mod report;
pub mod stores;

pub use error::LedgerError;
pub use ledger::{Ledger, LedgerConfig, RollbackPolicy, SNAPSHOT_NAME};
pub use report::{AuditReport, RollbackReport};
pub use stores::LedgerStores;

#[cfg(test)]
mod tests;
