//! Rollback target resolution and verification.

use tracing::debug;
use ward_tree::PatientTree;

use crate::entry::MutationEntry;
use crate::error::LogError;
use crate::key::EntryKey;
use crate::replay::{ReplayOptions, Replayer};

/// A verified rollback, not yet applied to any live state.
#[derive(Debug)]
pub struct RolledBack {
    /// Newest entry that stays in effect.
    pub target: EntryKey,
    /// Tree rebuilt from the first entry through `target`.
    pub tree: PatientTree,
    /// Entries newer than `target`, ascending.
    pub abandoned: Vec<EntryKey>,
}

/// Index (ascending, from 0) of the entry reached by undoing `steps` of
/// `entries` entries. `steps` must satisfy `1 <= steps < entries`.
pub fn resolve_target(entries: usize, steps: usize) -> Result<usize, LogError> {
    if steps == 0 || steps >= entries {
        return Err(LogError::InvalidRollback { steps, entries });
    }
    Ok(entries - 1 - steps)
}

/// Undo the last `steps` entries by replaying everything before them.
///
/// The whole prefix is verified; any mismatch aborts with the error of the
/// offending entry.
pub fn rollback(
    entries: &[MutationEntry],
    steps: usize,
    options: ReplayOptions,
) -> Result<RolledBack, LogError> {
    let index = resolve_target(entries.len(), steps)?;
    let (kept, dropped) = entries.split_at(index + 1);

    let tree = Replayer::replay(kept, options)?;
    let target = entries[index].key;
    debug!(target = %target, verified = kept.len(), "rollback prefix verified");

    Ok(RolledBack {
        target,
        tree,
        abandoned: dropped.iter().map(|e| e.key).collect(),
    })
}
