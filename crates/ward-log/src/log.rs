//! The append-only mutation log.

use tracing::{debug, info, warn};
use ward_store::{DurableStore, StoreError};
use ward_tree::PatientTree;

use crate::entry::{Mutation, MutationEntry};
use crate::error::LogError;
use crate::key::{Clock, EntryKey, KeyClock};

type Result<T> = std::result::Result<T, LogError>;

/// An entry that was passed over while scanning the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: String,
}

/// Result of reading the whole log.
#[derive(Debug, Clone, Default)]
pub struct LogScan {
    /// Parsed entries, ascending by key.
    pub entries: Vec<MutationEntry>,
    /// Entries whose body did not parse.
    pub skipped: Vec<SkippedEntry>,
}

/// Append-only log of tree mutations, one immutable blob per entry.
///
/// Every entry stores the fingerprint of the tree after its mutation, so a
/// replay from the empty tree can check each step.
pub struct MutationLog {
    store: Box<dyn DurableStore>,
    keys: KeyClock,
}

impl MutationLog {
    /// Open a log over `store`, seeding the key clock from the newest entry.
    pub fn open(store: Box<dyn DurableStore>, clock: Box<dyn Clock>) -> Result<Self> {
        let mut log = Self {
            store,
            keys: KeyClock::new(clock),
        };
        let keys = log.keys()?;
        if let Some(newest) = keys.last() {
            log.keys.witness(*newest);
        }
        debug!(entries = keys.len(), "opened mutation log");
        Ok(log)
    }

    /// Backing store of the log.
    pub fn store(&self) -> &dyn DurableStore {
        self.store.as_ref()
    }

    /// Record `mutation`, whose result is `tree`, as a new entry.
    ///
    /// The entry is fully written before it is write-protected. Failing to
    /// write-protect is logged, not returned.
    pub fn append(&mut self, mutation: Mutation, tree: &PatientTree) -> Result<MutationEntry> {
        let entry = MutationEntry {
            key: self.keys.tick(),
            mutation,
            hash: tree.fingerprint(),
        };
        let name = entry.key.to_string();

        self.store.write(&name, &entry.to_text())?;
        if let Err(e) = self.store.set_immutable(&name) {
            warn!(entry = %name, error = %e, "could not write-protect entry");
        }

        debug!(
            entry = %name,
            op = %entry.mutation.operation(),
            id = entry.mutation.id(),
            hash = %entry.hash,
            "appended entry"
        );
        Ok(entry)
    }

    /// Keys of all entries, ascending. Names that are not entry keys are
    /// skipped with a warning.
    pub fn keys(&self) -> Result<Vec<EntryKey>> {
        let mut keys = Vec::new();
        for name in self.store.list()? {
            match name.parse::<EntryKey>() {
                Ok(key) => keys.push(key),
                Err(_) => warn!(name = %name, "skipping non-entry name in log"),
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }

    /// Read and parse a single entry.
    pub fn read(&self, key: EntryKey) -> Result<MutationEntry> {
        let name = key.to_string();
        let text = self.store.read(&name)?;
        MutationEntry::parse(key, &text).map_err(|source| LogError::Malformed { name, source })
    }

    /// Read every entry, ascending. Entries that fail to parse are skipped
    /// with a warning and reported in [`LogScan::skipped`].
    pub fn scan(&self) -> Result<LogScan> {
        let mut scan = LogScan::default();
        for key in self.keys()? {
            match self.read(key) {
                Ok(entry) => scan.entries.push(entry),
                Err(LogError::Malformed { name, source }) => {
                    warn!(entry = %name, error = %source, "skipping unparsable entry");
                    scan.skipped.push(SkippedEntry {
                        name,
                        reason: source.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(scan)
    }

    /// Number of entries in the log.
    pub fn len(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Newest parsable entry, if any.
    pub fn head(&self) -> Result<Option<MutationEntry>> {
        Ok(self.scan()?.entries.pop())
    }

    /// Move every entry newer than `after` into `archive`, keeping it
    /// write-protected there. Returns the moved keys.
    pub fn archive_after(
        &mut self,
        after: EntryKey,
        archive: &dyn DurableStore,
    ) -> Result<Vec<EntryKey>> {
        let moved: Vec<EntryKey> = self.keys()?.into_iter().filter(|k| *k > after).collect();
        for key in &moved {
            let name = key.to_string();
            let text = self.store.read(&name)?;
            archive.write(&name, &text)?;
            if let Err(e) = archive.set_immutable(&name) {
                warn!(entry = %name, error = %e, "could not write-protect archived entry");
            }
            self.unprotect(&name)?;
            self.store.delete(&name)?;
            debug!(entry = %name, "archived entry");
        }
        Ok(moved)
    }

    /// Delete every entry. Returns how many were removed.
    pub fn purge(&mut self) -> Result<usize> {
        let keys = self.keys()?;
        for key in &keys {
            let name = key.to_string();
            self.unprotect(&name)?;
            self.store.delete(&name)?;
        }
        info!(entries = keys.len(), "purged mutation log");
        Ok(keys.len())
    }

    // ----- Internal -----

    fn unprotect(&self, name: &str) -> Result<()> {
        match self.store.clear_immutable(name) {
            Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
