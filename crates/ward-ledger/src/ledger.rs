//! [`Ledger`]: the live patient tree with its tamper-evident history.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ward_log::{
    Browse, Clock, LogScan, Mutation, MutationEntry, MutationLog, ReplayOptions, Replayer,
};
use ward_store::{DurableStore, StoreError};
use ward_tree::{PatientTree, Snapshot};
use ward_types::{Fingerprint, PatientData, PatientId, PatientPatch};

use crate::error::LedgerError;
use crate::report::{AuditReport, RollbackReport};
use crate::stores::LedgerStores;

type Result<T> = std::result::Result<T, LedgerError>;

/// Name of the level-order tree snapshot in the state store.
pub const SNAPSHOT_NAME: &str = "current_tree";

/// What happens to log entries undone by a rollback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackPolicy {
    /// Leave them in the log. A later full audit fails at the first entry
    /// written after the rollback.
    #[default]
    Abandon,
    /// Move them to the archive store so the log stays replayable.
    Archive,
}

/// Configuration for a [`Ledger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    pub replay: ReplayOptions,
    pub rollback_policy: RollbackPolicy,
}

/// The live patient tree, its mutation log and its snapshot.
///
/// Every mutation is computed on a copy of the tree, logged, and only then
/// made live, so a failed append leaves the live tree untouched.
pub struct Ledger {
    tree: PatientTree,
    log: MutationLog,
    state: Box<dyn DurableStore>,
    archive: Box<dyn DurableStore>,
    config: LedgerConfig,
}

impl Ledger {
    /// Open a ledger: restore the tree from its snapshot (if any) and open
    /// the log.
    pub fn open(stores: LedgerStores, config: LedgerConfig, clock: Box<dyn Clock>) -> Result<Self> {
        let tree = match stores.state.read(SNAPSHOT_NAME) {
            Ok(text) => Snapshot::parse(&text).restore(),
            Err(StoreError::NotFound(_)) => PatientTree::new(),
            Err(e) => return Err(e.into()),
        };
        let log = MutationLog::open(stores.log, clock)?;

        let ledger = Self {
            tree,
            log,
            state: stores.state,
            archive: stores.archive,
            config,
        };

        let fingerprint = ledger.tree.fingerprint();
        match ledger.log.head()? {
            Some(head) if head.hash != fingerprint => warn!(
                head = %head.key,
                logged = %head.hash,
                live = %fingerprint,
                "snapshot does not match newest log entry"
            ),
            None if !ledger.tree.is_empty() => {
                warn!(records = ledger.tree.len(), "snapshot present but log is empty")
            }
            _ => {}
        }
        info!(records = ledger.tree.len(), %fingerprint, "opened ledger");
        Ok(ledger)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Insert a new record. Fails with [`LedgerError::DuplicateKey`] if the
    /// id is taken; nothing is logged then.
    pub fn add(&mut self, record: PatientData) -> Result<MutationEntry> {
        if record.has_empty_disease() {
            return Err(LedgerError::EmptyDisease(record.id));
        }
        if self.tree.contains(record.id) {
            return Err(LedgerError::DuplicateKey(record.id));
        }
        let mut next = self.tree.clone();
        next.insert(record.clone());
        self.commit(next, Mutation::Add { record })
    }

    /// Overwrite the fields present in `patch` on an existing record.
    pub fn update(&mut self, id: PatientId, patch: &PatientPatch) -> Result<MutationEntry> {
        if patch.has_empty_disease() {
            return Err(LedgerError::EmptyDisease(id));
        }
        let prior = self.tree.search(id).cloned().ok_or(LedgerError::NotFound(id))?;
        let mut next = self.tree.clone();
        next.update(id, patch);
        let record = next.search(id).cloned().ok_or(LedgerError::NotFound(id))?;
        self.commit(next, Mutation::Update { prior, record })
    }

    /// Delete a record.
    pub fn remove(&mut self, id: PatientId) -> Result<MutationEntry> {
        let mut next = self.tree.clone();
        let prior = next.remove(id).ok_or(LedgerError::NotFound(id))?;
        self.commit(next, Mutation::Remove { prior })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get(&self, id: PatientId) -> Option<&PatientData> {
        self.tree.search(id)
    }

    /// Records in ascending id order.
    pub fn records(&self) -> impl Iterator<Item = &PatientData> {
        self.tree.iter()
    }

    pub fn tree(&self) -> &PatientTree {
        &self.tree
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.tree.fingerprint()
    }

    /// All parsable entries, ascending, plus the ones that were skipped.
    pub fn history(&self) -> Result<LogScan> {
        Ok(self.log.scan()?)
    }

    // ------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------

    /// Replay the whole log from the empty tree, verifying every entry.
    ///
    /// A fingerprint mismatch is returned as an error naming the entry.
    pub fn audit(&self) -> Result<AuditReport> {
        let scan = self.log.scan()?;
        let rebuilt = Replayer::replay(&scan.entries, self.config.replay)?;
        let fingerprint = rebuilt.fingerprint();
        let report = AuditReport {
            entries: scan.entries.len(),
            skipped: scan.skipped,
            fingerprint,
            matches_live: rebuilt == self.tree,
        };
        info!(
            entries = report.entries,
            skipped = report.skipped.len(),
            matches_live = report.matches_live,
            "audit complete"
        );
        Ok(report)
    }

    /// Step through the history, verifying as it goes.
    pub fn browse(&self) -> Result<Browse> {
        let scan = self.log.scan()?;
        Ok(Browse::new(scan.entries, self.config.replay))
    }

    /// Undo the last `steps` entries.
    ///
    /// The remaining prefix is replayed and verified, and its snapshot
    /// written, before the live tree changes; if either fails the live tree
    /// and snapshot are left exactly as they were. Once the tree is swapped
    /// the rollback has happened: a failure to archive is only logged and
    /// shows in [`RollbackReport::archived`].
    pub fn rollback(&mut self, steps: usize) -> Result<RollbackReport> {
        let scan = self.log.scan()?;
        let rolled = ward_log::rollback(&scan.entries, steps, self.config.replay)?;

        write_snapshot(self.state.as_ref(), &rolled.tree)?;
        self.tree = rolled.tree;

        let archived = match self.config.rollback_policy {
            RollbackPolicy::Abandon => 0,
            RollbackPolicy::Archive => {
                match self.log.archive_after(rolled.target, self.archive.as_ref()) {
                    Ok(moved) => moved.len(),
                    Err(e) => {
                        warn!(
                            error = %e,
                            "rolled back, but abandoned entries were not all archived"
                        );
                        let left = self
                            .log
                            .keys()
                            .map(|keys| keys.iter().filter(|k| **k > rolled.target).count())
                            .unwrap_or(rolled.abandoned.len());
                        rolled.abandoned.len().saturating_sub(left)
                    }
                }
            }
        };

        let report = RollbackReport {
            target: rolled.target,
            abandoned: rolled.abandoned,
            archived,
            fingerprint: self.tree.fingerprint(),
        };
        info!(
            target = %report.target,
            abandoned = report.abandoned.len(),
            archived,
            fingerprint = %report.fingerprint,
            "rolled back"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Delete every log entry and the snapshot, leaving an empty ledger.
    /// Refused unless `confirmed`.
    pub fn purge(&mut self, confirmed: bool) -> Result<usize> {
        if !confirmed {
            return Err(LedgerError::PurgeNotConfirmed);
        }
        let removed = self.log.purge()?;
        self.state.delete(SNAPSHOT_NAME)?;
        self.tree = PatientTree::new();
        info!(entries = removed, "purged ledger");
        Ok(removed)
    }

    /// Rewrite the snapshot of the live tree.
    pub fn save_snapshot(&self) -> Result<()> {
        write_snapshot(self.state.as_ref(), &self.tree)
    }

    // ----- Internal -----

    /// Log `mutation` and make `next` live.
    ///
    /// The logged entry is the point of no return. A snapshot that cannot be
    /// written afterwards is stale, not fatal: it is reported with `warn!`,
    /// flagged again on the next open, and repaired by the next save.
    fn commit(&mut self, next: PatientTree, mutation: Mutation) -> Result<MutationEntry> {
        let entry = self.log.append(mutation, &next)?;
        self.tree = next;
        if let Err(e) = self.save_snapshot() {
            warn!(entry = %entry.key, error = %e, "entry logged but snapshot not saved");
        }
        Ok(entry)
    }
}

fn write_snapshot(state: &dyn DurableStore, tree: &PatientTree) -> Result<()> {
    let text = Snapshot::capture(tree).to_text();
    state.write(SNAPSHOT_NAME, &text)?;
    debug!(records = tree.len(), "saved snapshot");
    Ok(())
}
