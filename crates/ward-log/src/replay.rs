//! Replay and verification of the mutation log.
//!
//! A [`Replayer`] rebuilds the tree from the empty state one entry at a time,
//! checking after every step that the rebuilt tree hashes to the fingerprint
//! stored in the entry. The first mismatch poisons the replayer: the partial
//! tree is no longer handed out.

use tracing::{debug, error, warn};
use ward_tree::PatientTree;
use ward_types::PatientPatch;

use crate::entry::{Mutation, MutationEntry};
use crate::error::LogError;
use crate::key::EntryKey;

type Result<T> = std::result::Result<T, LogError>;

/// Knobs for how entries are applied during replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Treat an update of a missing record as corruption instead of
    /// inserting the resulting record.
    pub strict_updates: bool,
}

/// Where a replay stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    /// No entry applied yet.
    Empty,
    /// Every entry so far matched its fingerprint.
    Replaying,
    /// All entries matched.
    Verified,
    /// The named entry failed verification.
    Corrupted(EntryKey),
}

/// Step-by-step log replayer.
#[derive(Debug)]
pub struct Replayer {
    state: ReplayState,
    tree: PatientTree,
    options: ReplayOptions,
    applied: usize,
    last: Option<EntryKey>,
}

impl Replayer {
    pub fn new(options: ReplayOptions) -> Self {
        Self {
            state: ReplayState::Empty,
            tree: PatientTree::new(),
            options,
            applied: 0,
            last: None,
        }
    }

    /// Replay `entries` from the empty tree and return the verified result.
    pub fn replay<'a>(
        entries: impl IntoIterator<Item = &'a MutationEntry>,
        options: ReplayOptions,
    ) -> Result<PatientTree> {
        let mut replayer = Self::new(options);
        for entry in entries {
            replayer.step(entry)?;
        }
        replayer.finish()?;
        replayer.into_verified()
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    /// Number of entries applied and verified.
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Key of the last verified entry.
    pub fn last_key(&self) -> Option<EntryKey> {
        self.last
    }

    /// The tree rebuilt so far, unless the replay hit a corrupted entry.
    pub fn working_tree(&self) -> Option<&PatientTree> {
        match self.state {
            ReplayState::Corrupted(_) => None,
            _ => Some(&self.tree),
        }
    }

    /// Apply one entry and verify the resulting fingerprint.
    pub fn step(&mut self, entry: &MutationEntry) -> Result<&PatientTree> {
        match self.state {
            ReplayState::Corrupted(key) => return Err(LogError::Halted(key)),
            ReplayState::Verified => return Err(LogError::Finished),
            ReplayState::Empty | ReplayState::Replaying => {}
        }
        if let Some(previous) = self.last
            && entry.key <= previous
        {
            return Err(LogError::OutOfOrder {
                key: entry.key,
                previous,
            });
        }

        self.state = ReplayState::Replaying;
        if let Err(e) = self.apply(entry) {
            self.state = ReplayState::Corrupted(entry.key);
            return Err(e);
        }

        let actual = self.tree.fingerprint();
        if actual != entry.hash {
            error!(
                entry = %entry.key,
                expected = %entry.hash,
                actual = %actual,
                "fingerprint mismatch during replay"
            );
            self.state = ReplayState::Corrupted(entry.key);
            return Err(LogError::Integrity {
                key: entry.key,
                expected: entry.hash,
                actual,
            });
        }

        self.applied += 1;
        self.last = Some(entry.key);
        debug!(entry = %entry.key, op = %entry.mutation.operation(), "verified entry");
        Ok(&self.tree)
    }

    /// Declare the input exhausted. Moves to `Verified` unless corrupted.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            ReplayState::Corrupted(key) => Err(LogError::Halted(key)),
            _ => {
                self.state = ReplayState::Verified;
                Ok(())
            }
        }
    }

    /// Take the reconstructed tree of a verified replay.
    pub fn into_verified(self) -> Result<PatientTree> {
        match self.state {
            ReplayState::Verified => Ok(self.tree),
            ReplayState::Corrupted(key) => Err(LogError::Halted(key)),
            ReplayState::Empty | ReplayState::Replaying => Err(LogError::Unfinished),
        }
    }

    // ----- Internal -----

    fn apply(&mut self, entry: &MutationEntry) -> Result<()> {
        match &entry.mutation {
            Mutation::Add { record } => {
                if !self.tree.insert(record.clone()) {
                    warn!(entry = %entry.key, id = record.id, "add of existing record ignored");
                }
            }
            Mutation::Update { record, .. } => {
                let patch = PatientPatch::replace_with(record);
                if !self.tree.update(record.id, &patch) {
                    if self.options.strict_updates {
                        return Err(LogError::MissingUpdateTarget {
                            key: entry.key,
                            id: record.id,
                        });
                    }
                    warn!(entry = %entry.key, id = record.id, "update target missing, inserting");
                    self.tree.insert(record.clone());
                }
            }
            Mutation::Remove { prior } => {
                if self.tree.remove(prior.id).is_none() {
                    warn!(entry = %entry.key, id = prior.id, "remove target missing");
                }
            }
        }
        Ok(())
    }
}

/// Iterator over a log replay that verifies entries as it yields them.
///
/// Between items the caller can inspect [`Browse::tree`]. Iteration stops
/// after the first error. Once the entries run out the replay is `Verified`.
#[derive(Debug)]
pub struct Browse {
    entries: std::vec::IntoIter<MutationEntry>,
    replayer: Replayer,
    total: usize,
    done: bool,
}

impl Browse {
    pub fn new(entries: Vec<MutationEntry>, options: ReplayOptions) -> Self {
        Self {
            total: entries.len(),
            entries: entries.into_iter(),
            replayer: Replayer::new(options),
            done: false,
        }
    }

    /// Total number of entries to replay.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn state(&self) -> ReplayState {
        self.replayer.state()
    }

    /// The tree after the last yielded entry.
    pub fn tree(&self) -> Option<&PatientTree> {
        self.replayer.working_tree()
    }

    pub fn replayer(&self) -> &Replayer {
        &self.replayer
    }
}

impl Iterator for Browse {
    type Item = Result<MutationEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(entry) = self.entries.next() else {
            self.done = true;
            return self.replayer.finish().err().map(Err);
        };
        match self.replayer.step(&entry) {
            Ok(_) => Some(Ok(entry)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
