//! Append-only mutation log for the patient tree.
//!
//! Every change to the tree is written as a [`MutationEntry`] carrying the
//! fingerprint of the tree after the change. Entries are named by an
//! [`EntryKey`] (the second they were written plus a sequence number) and
//! write-protected once stored. Replaying the log from the empty tree with a
//! [`Replayer`] recomputes every fingerprint, so any tampering with an entry
//! or with the recorded history shows up as a mismatch. Rollback replays a
//! verified prefix of the log.

mod entry;
mod error;
mod key;
mod log;
mod replay;
mod rollback;

#[cfg(test)]
mod tests;

pub use entry::{Mutation, MutationEntry, Operation};
pub use error::{EntryParseError, LogError};
pub use key::{Clock, EntryKey, InvalidKey, KEY_FORMAT, KeyClock, ManualClock, SystemClock};
pub use log::{LogScan, MutationLog, SkippedEntry};
pub use replay::{Browse, ReplayOptions, ReplayState, Replayer};
pub use rollback::{RolledBack, resolve_target, rollback};
