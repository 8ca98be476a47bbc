//! Error types for the mutation log.

use ward_store::StoreError;
use ward_types::{Fingerprint, ParseError, PatientId};

use crate::key::EntryKey;

/// Why an entry body could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryParseError {
    /// The body is empty.
    #[error("empty entry")]
    Empty,

    /// The first line is not `add`, `update` or `remove`.
    #[error("unknown operation {0:?}")]
    UnknownOperation(String),

    /// The body ends before a required line.
    #[error("missing {0} line")]
    MissingLine(&'static str),

    /// A data line is not a valid record.
    #[error("bad record line: {0}")]
    Record(#[from] ParseError),

    /// The hash line lacks the `hash: ` prefix.
    #[error("malformed hash line {0:?}")]
    HashLine(String),

    /// The hash is not 64 hex characters.
    #[error("bad hash: {0}")]
    Hash(ParseError),

    /// Non-blank text follows the hash line.
    #[error("unexpected text after hash line")]
    TrailingText,
}

/// Errors that can occur during mutation log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// An entry body could not be parsed.
    #[error("malformed entry {name}: {source}")]
    Malformed {
        name: String,
        #[source]
        source: EntryParseError,
    },

    /// The replayed state does not hash to the fingerprint stored in an entry.
    #[error("fingerprint mismatch at entry {key}: stored {expected}, replayed {actual}")]
    Integrity {
        key: EntryKey,
        expected: Fingerprint,
        actual: Fingerprint,
    },

    /// Strict replay met an update for a record that is not in the tree.
    #[error("entry {key} updates patient {id}, which does not exist")]
    MissingUpdateTarget { key: EntryKey, id: PatientId },

    /// Entries were fed to a replayer out of ascending key order.
    #[error("entry {key} does not follow {previous}")]
    OutOfOrder { key: EntryKey, previous: EntryKey },

    /// The replayer already stopped on a corrupted entry.
    #[error("replay halted at corrupted entry {0}")]
    Halted(EntryKey),

    /// The replayer already finished.
    #[error("replay already verified")]
    Finished,

    /// The reconstructed tree was requested before the replay finished.
    #[error("replay not finished")]
    Unfinished,

    /// Rollback step count outside `1..entries`.
    #[error("cannot roll back {steps} step(s) over {entries} entr(y/ies)")]
    InvalidRollback { steps: usize, entries: usize },
}
