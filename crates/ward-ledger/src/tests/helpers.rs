//! Shared test utilities for ward-ledger tests.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use ward_log::ManualClock;
use ward_store::{DurableStore, MemoryStore, StoreError};
use ward_types::{PatientData, PatientId};

use crate::ledger::{Ledger, LedgerConfig};
use crate::stores::LedgerStores;

/// A ledger over in-memory stores, with handles kept for inspection and
/// tampering.
pub struct TestLedger {
    pub ledger: Ledger,
    pub log: Arc<MemoryStore>,
    pub state: Arc<MemoryStore>,
    pub archive: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    state_full: Arc<AtomicBool>,
}

impl TestLedger {
    /// Name of the `n`-th entry (from 0) when entries are written one second
    /// apart, as [`add_all`] does.
    pub fn entry_name(&self, n: u32) -> String {
        format!("01-01-2025 10-00-{n:02}")
    }

    /// Move the clock on so the next entry gets its own second.
    pub fn tick(&self) {
        self.clock.advance(1);
    }

    /// Make every write to the state store fail until switched back.
    pub fn fail_state_writes(&self, fail: bool) {
        self.state_full.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot_text(&self) -> Option<String> {
        self.state.read(crate::SNAPSHOT_NAME).ok()
    }
}

pub fn memory_ledger(config: LedgerConfig) -> TestLedger {
    let log = Arc::new(MemoryStore::new());
    let state = Arc::new(MemoryStore::new());
    let archive = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    ));
    let state_full = Arc::new(AtomicBool::new(false));
    let stores = LedgerStores {
        log: Box::new(log.clone()),
        state: Box::new(FullDisk {
            inner: state.clone(),
            full: state_full.clone(),
        }),
        archive: Box::new(archive.clone()),
    };
    let ledger = Ledger::open(stores, config, Box::new(clock.clone())).unwrap();
    TestLedger {
        ledger,
        log,
        state,
        archive,
        clock,
        state_full,
    }
}

pub fn patient(id: PatientId, name: &str) -> PatientData {
    PatientData::new(id, name, false, Vec::<String>::new())
}

/// Add records one second apart.
pub fn add_all(t: &mut TestLedger, ids: &[PatientId]) {
    for &id in ids {
        t.ledger.add(patient(id, &format!("P{id}"))).unwrap();
        t.tick();
    }
}

/// Store that refuses writes while `full` is set, as a full disk would.
struct FullDisk {
    inner: Arc<MemoryStore>,
    full: Arc<AtomicBool>,
}

impl DurableStore for FullDisk {
    fn list(&self) -> Result<Vec<String>, StoreError> {
        self.inner.list()
    }

    fn read(&self, name: &str) -> Result<String, StoreError> {
        self.inner.read(name)
    }

    fn write(&self, name: &str, text: &str) -> Result<(), StoreError> {
        if self.full.load(Ordering::SeqCst) {
            return Err(io::Error::other("disk full").into());
        }
        self.inner.write(name, text)
    }

    fn contains(&self, name: &str) -> Result<bool, StoreError> {
        self.inner.contains(name)
    }

    fn set_immutable(&self, name: &str) -> Result<(), StoreError> {
        self.inner.set_immutable(name)
    }

    fn clear_immutable(&self, name: &str) -> Result<(), StoreError> {
        self.inner.clear_immutable(name)
    }

    fn is_immutable(&self, name: &str) -> Result<bool, StoreError> {
        self.inner.is_immutable(name)
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.inner.delete(name)
    }
}
