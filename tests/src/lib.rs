//! Shared test harness for ward integration tests.
//!
//! Provides [`TestWard`]: an on-disk ledger in a temporary directory driven
//! by a manual clock, which can be closed and reopened, and whose files can
//! be tampered with the way someone with disk access would.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;
use ward_ledger::{Ledger, LedgerConfig, LedgerStores, SNAPSHOT_NAME};
use ward_log::{EntryKey, ManualClock};
use ward_store::{DurableStore, FileStore};
use ward_types::{PatientData, PatientId, PatientPatch};

// =========================================================================
// On-disk ledger
// =========================================================================

/// A ledger rooted in a temporary directory.
pub struct TestWard {
    dir: TempDir,
    clock: Arc<ManualClock>,
    config: LedgerConfig,
    ledger: Option<Ledger>,
}

impl TestWard {
    /// Open a fresh ledger. The clock starts at 01-01-2025 10-00-00.
    pub fn new(config: LedgerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        ));
        let mut ward = Self {
            dir: TempDir::new().unwrap(),
            clock,
            config,
            ledger: None,
        };
        ward.reopen();
        ward
    }

    pub fn ledger(&mut self) -> &mut Ledger {
        self.ledger.as_mut().expect("ledger is open")
    }

    /// Close the ledger and open it again from disk.
    pub fn reopen(&mut self) {
        self.ledger = None;
        let stores = LedgerStores::on_disk(self.dir.path()).unwrap();
        self.ledger = Some(Ledger::open(stores, self.config, Box::new(self.clock.clone())).unwrap());
    }

    /// Advance the clock by one second.
    pub fn tick(&self) {
        self.clock.advance(1);
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.path().join(SNAPSHOT_NAME)
    }

    pub fn log_store(&self) -> FileStore {
        FileStore::new(self.dir.path().join("log")).unwrap()
    }

    pub fn archive_store(&self) -> FileStore {
        FileStore::new(self.dir.path().join("archive")).unwrap()
    }

    /// Entry names on disk, oldest first.
    pub fn entry_names(&self) -> Vec<String> {
        let mut keys: Vec<EntryKey> = self
            .log_store()
            .list()
            .unwrap()
            .iter()
            .filter_map(|n| n.parse().ok())
            .collect();
        keys.sort();
        keys.iter().map(ToString::to_string).collect()
    }

    /// Overwrite an entry behind the ledger's back, keeping it read-only.
    pub fn rewrite_entry(&self, name: &str, edit: impl FnOnce(String) -> String) {
        let store = self.log_store();
        let text = store.read(name).unwrap();
        store.clear_immutable(name).unwrap();
        store.write(name, &edit(text)).unwrap();
        store.set_immutable(name).unwrap();
    }

    /// Delete an entry behind the ledger's back.
    pub fn delete_entry(&self, name: &str) {
        let store = self.log_store();
        store.clear_immutable(name).unwrap();
        store.delete(name).unwrap();
    }
}

// =========================================================================
// Workloads
// =========================================================================

pub fn patient(id: PatientId) -> PatientData {
    PatientData::new(id, format!("P{id}"), false, Vec::<String>::new())
}

/// Deterministic pseudo-random operation source.
pub struct Workload {
    state: u32,
}

impl Workload {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        self.state >> 16
    }

    /// Apply one random add, update or remove to `ledger`, advancing the
    /// clock first. Ids are drawn from `0..id_space`.
    pub fn step(&mut self, ward: &mut TestWard, id_space: u32) {
        ward.tick();
        let id = PatientId::from(self.next() % id_space);
        let roll = self.next() % 10;
        let ledger = ward.ledger();
        let exists = ledger.get(id).is_some();

        if !exists {
            let diseases: Vec<String> = (0..self.next() % 3)
                .map(|i| format!("d{i}, {}", self.next() % 7))
                .collect();
            let record = PatientData::new(id, format!("Name {id}"), roll % 2 == 0, diseases);
            ledger.add(record).unwrap();
        } else if roll < 6 {
            let patch = PatientPatch {
                name: (roll % 2 == 0).then(|| format!("Renamed {}", self.next())),
                cured: Some(roll % 3 == 0),
                diseases: None,
            };
            ledger.update(id, &patch).unwrap();
        } else {
            ledger.remove(id).unwrap();
        }
    }

    /// Run `steps` operations.
    pub fn run(&mut self, ward: &mut TestWard, steps: usize, id_space: u32) {
        for _ in 0..steps {
            self.step(ward, id_space);
        }
    }
}
