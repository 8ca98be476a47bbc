//! End-to-end history tests: sessions across restarts, audit, browse and
//! rollback on disk.

use ward_integration_tests::{TestWard, Workload, patient};
use ward_ledger::{LedgerConfig, RollbackPolicy};
use ward_log::{LogError, ReplayState};
use ward_store::DurableStore;

#[test]
fn test_session_survives_restarts() {
    let mut ward = TestWard::new(LedgerConfig::default());
    let mut workload = Workload::new(7);

    for _ in 0..4 {
        workload.run(&mut ward, 40, 25);
        let before = ward.ledger().fingerprint();
        ward.reopen();
        assert_eq!(ward.ledger().fingerprint(), before);
    }

    let report = ward.ledger().audit().unwrap();
    assert_eq!(report.entries, 160);
    assert!(report.is_clean());
    ward.ledger().tree().validate().unwrap();
}

#[test]
fn test_entries_in_the_same_second_keep_their_order() {
    let mut ward = TestWard::new(LedgerConfig::default());
    for id in 1..=12 {
        ward.ledger().add(patient(id)).unwrap();
    }

    let names = ward.entry_names();
    assert_eq!(names.len(), 12);
    assert_eq!(names[0], "01-01-2025 10-00-00");
    assert_eq!(names[11], "01-01-2025 10-00-00.11");

    let history = ward.ledger().history().unwrap();
    let ids: Vec<i64> = history.entries.iter().map(|e| e.mutation.id()).collect();
    assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    assert!(ward.ledger().audit().unwrap().is_clean());
}

#[test]
fn test_clock_stepping_back_keeps_history_ordered() {
    let mut ward = TestWard::new(LedgerConfig::default());
    ward.ledger().add(patient(1)).unwrap();
    ward.clock().advance(-86_400);
    ward.reopen();
    ward.ledger().add(patient(2)).unwrap();

    assert_eq!(
        ward.entry_names(),
        vec!["01-01-2025 10-00-00", "01-01-2025 10-00-00.1"]
    );
    assert!(ward.ledger().audit().unwrap().is_clean());
}

#[test]
fn test_browse_matches_audit() {
    let mut ward = TestWard::new(LedgerConfig::default());
    Workload::new(11).run(&mut ward, 30, 10);

    let audit = ward.ledger().audit().unwrap();
    let mut browse = ward.ledger().browse().unwrap();
    let mut seen = 0;
    while let Some(item) = browse.next() {
        let entry = item.unwrap();
        assert_eq!(browse.tree().unwrap().fingerprint(), entry.hash);
        seen += 1;
    }

    assert_eq!(seen, audit.entries);
    assert_eq!(browse.state(), ReplayState::Verified);
    assert_eq!(browse.tree().unwrap().fingerprint(), audit.fingerprint);
}

#[test]
fn test_rollback_abandon_then_restart() {
    let mut ward = TestWard::new(LedgerConfig::default());
    for id in [5, 3, 8, 1] {
        ward.tick();
        ward.ledger().add(patient(id)).unwrap();
    }
    let after_three = {
        let entries = ward.ledger().history().unwrap().entries;
        entries[2].hash
    };

    let report = ward.ledger().rollback(1).unwrap();
    assert_eq!(report.fingerprint, after_three);

    ward.reopen();
    assert_eq!(ward.ledger().fingerprint(), after_three);
    assert!(ward.ledger().get(1).is_none());
    assert_eq!(ward.entry_names().len(), 4);

    // New work on top of abandoned entries no longer replays.
    ward.tick();
    ward.ledger().add(patient(9)).unwrap();
    let last = ward.entry_names().pop().unwrap();
    match ward.ledger().audit() {
        Err(ward_ledger::LedgerError::Log(LogError::Integrity { key, .. })) => {
            assert_eq!(key.to_string(), last)
        }
        other => panic!("expected integrity failure, got {other:?}"),
    }
}

#[test]
fn test_rollback_archive_then_restart() {
    let config = LedgerConfig {
        rollback_policy: RollbackPolicy::Archive,
        ..Default::default()
    };
    let mut ward = TestWard::new(config);
    Workload::new(3).run(&mut ward, 20, 8);
    let names = ward.entry_names();

    let report = ward.ledger().rollback(5).unwrap();
    assert_eq!(report.archived, 5);

    let archive = ward.archive_store();
    let mut archived = archive.list().unwrap();
    archived.sort_by_key(|n| n.parse::<ward_log::EntryKey>().unwrap());
    assert_eq!(archived, names[15..].to_vec());
    assert!(archived.iter().all(|n| archive.is_immutable(n).unwrap()));

    ward.reopen();
    Workload::new(4).run(&mut ward, 10, 8);
    let audit = ward.ledger().audit().unwrap();
    assert!(audit.is_clean());
    assert_eq!(audit.entries, 25);
}

#[test]
fn test_purge_then_fresh_history() {
    let mut ward = TestWard::new(LedgerConfig::default());
    Workload::new(5).run(&mut ward, 10, 5);

    assert_eq!(ward.ledger().purge(true).unwrap(), 10);
    assert!(ward.entry_names().is_empty());
    assert!(!ward.snapshot_path().exists());

    ward.reopen();
    assert!(ward.ledger().tree().is_empty());
    ward.tick();
    ward.ledger().add(patient(1)).unwrap();
    assert!(ward.ledger().audit().unwrap().is_clean());
}
