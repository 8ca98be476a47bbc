//! Outcomes of audit and rollback.

use ward_log::{EntryKey, SkippedEntry};
use ward_types::Fingerprint;

/// Result of a full-history replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// Entries replayed and verified.
    pub entries: usize,
    /// Entries that could not be parsed and were left out.
    pub skipped: Vec<SkippedEntry>,
    /// Fingerprint of the reconstructed tree.
    pub fingerprint: Fingerprint,
    /// Whether the reconstruction equals the live tree.
    pub matches_live: bool,
}

impl AuditReport {
    /// Verified, nothing skipped, and in agreement with the live tree.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.matches_live
    }
}

/// Result of a successful rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    /// Newest entry still in effect.
    pub target: EntryKey,
    /// Entries no longer in effect, ascending.
    pub abandoned: Vec<EntryKey>,
    /// How many of them were moved to the archive.
    pub archived: usize,
    /// Fingerprint of the new live tree.
    pub fingerprint: Fingerprint,
}
