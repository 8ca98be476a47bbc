//! Tests for the mutation log crate.


use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use ward_store::MemoryStore;
use ward_tree::PatientTree;
use ward_types::{PatientData, PatientId, PatientPatch};

use crate::entry::{Mutation, MutationEntry};
use crate::key::ManualClock;
use crate::log::MutationLog;

/// 01-01-2025 10-00-00
fn start() -> NaiveDateTime {
    at(2025, 1, 1, 10, 0, 0)
}

fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(hh, mm, ss)
        .unwrap()
}

fn rec(id: PatientId, name: &str) -> PatientData {
    PatientData::new(id, name, false, Vec::<String>::new())
}

/// A log over an in-memory store, mirrored by a live tree the way a ledger
/// would drive it. The clock moves one second per mutation.
struct Harness {
    log: MutationLog,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    tree: PatientTree,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        let log = MutationLog::open(Box::new(store.clone()), Box::new(clock.clone())).unwrap();
        Self {
            log,
            store,
            clock,
            tree: PatientTree::new(),
        }
    }

    fn add(&mut self, record: PatientData) -> MutationEntry {
        assert!(self.tree.insert(record.clone()));
        self.commit(Mutation::Add { record })
    }

    fn update(&mut self, id: PatientId, patch: PatientPatch) -> MutationEntry {
        let prior = self.tree.search(id).cloned().unwrap();
        assert!(self.tree.update(id, &patch));
        let record = self.tree.search(id).cloned().unwrap();
        self.commit(Mutation::Update { prior, record })
    }

    fn remove(&mut self, id: PatientId) -> MutationEntry {
        let prior = self.tree.remove(id).unwrap();
        self.commit(Mutation::Remove { prior })
    }

    fn entries(&self) -> Vec<MutationEntry> {
        self.log.scan().unwrap().entries
    }

    fn commit(&mut self, mutation: Mutation) -> MutationEntry {
        let entry = self.log.append(mutation, &self.tree).unwrap();
        self.clock.advance(1);
        entry
    }
}
