//! Tamper-evidence tests: editing, deleting, forging and reordering entries
//! on disk, and editing the snapshot.

use ward_integration_tests::{TestWard, patient};
use ward_ledger::{LedgerConfig, LedgerError};
use ward_log::{LogError, Mutation, MutationEntry};
use ward_store::DurableStore;
use ward_tree::PatientTree;

fn seeded() -> TestWard {
    let mut ward = TestWard::new(LedgerConfig::default());
    for id in [4, 2, 6, 1, 3, 5] {
        ward.tick();
        ward.ledger().add(patient(id)).unwrap();
    }
    ward
}

/// Name of the entry the audit stopped at.
fn failing_entry(ward: &mut TestWard) -> String {
    match ward.ledger().audit() {
        Err(LedgerError::Log(LogError::Integrity { key, .. })) => key.to_string(),
        other => panic!("expected integrity failure, got {other:?}"),
    }
}

#[test]
fn test_edited_record_is_caught() {
    let mut ward = seeded();
    let names = ward.entry_names();
    ward.rewrite_entry(&names[2], |t| t.replace("6 P6 False", "6 P6 True"));

    assert_eq!(failing_entry(&mut ward), names[2]);
}

#[test]
fn test_edited_hash_is_caught() {
    let mut ward = seeded();
    let names = ward.entry_names();
    ward.rewrite_entry(&names[4], |t| {
        let (body, _) = t.rsplit_once("hash: ").unwrap();
        format!("{body}hash: {}", "0".repeat(64))
    });

    assert_eq!(failing_entry(&mut ward), names[4]);
}

#[test]
fn test_deleted_entry_is_caught_at_its_successor() {
    let mut ward = seeded();
    let names = ward.entry_names();
    ward.delete_entry(&names[1]);

    assert_eq!(failing_entry(&mut ward), names[2]);
}

#[test]
fn test_forged_entry_breaks_chain_at_next_entry() {
    let mut ward = seeded();
    let names = ward.entry_names();

    // A self-consistent add slipped in between the 3rd and 4th entries.
    let history = ward.ledger().history().unwrap().entries;
    let mut forged_tree = ward_log::Replayer::replay(
        &history[..3],
        ward_log::ReplayOptions::default(),
    )
    .unwrap();
    forged_tree.insert(patient(99));
    let forged = MutationEntry {
        key: format!("{}.1", names[2]).parse().unwrap(),
        mutation: Mutation::Add {
            record: patient(99),
        },
        hash: forged_tree.fingerprint(),
    };
    ward.log_store()
        .write(&forged.key.to_string(), &forged.to_text())
        .unwrap();

    assert_eq!(failing_entry(&mut ward), names[3]);
}

#[test]
fn test_swapped_entries_are_caught() {
    let mut ward = seeded();
    let names = ward.entry_names();
    let store = ward.log_store();
    let a = store.read(&names[0]).unwrap();
    let b = store.read(&names[1]).unwrap();
    ward.rewrite_entry(&names[0], |_| b);
    ward.rewrite_entry(&names[1], |_| a);

    assert_eq!(failing_entry(&mut ward), names[0]);
}

#[test]
fn test_unparsable_entry_is_reported_not_fatal() {
    let mut ward = seeded();
    let names = ward.entry_names();
    ward.rewrite_entry(&names[5], |_| "scribbled over".to_string());

    let report = ward.ledger().audit().unwrap();
    assert_eq!(report.entries, 5);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, names[5]);
    assert!(!report.matches_live);
}

#[test]
fn test_stray_files_are_ignored() {
    let mut ward = seeded();
    let log = ward.log_store();
    log.write("README", "not an entry").unwrap();
    log.write("1-1-2025 10-00-00", "not canonical").unwrap();

    let report = ward.ledger().audit().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.entries, 6);
}

#[test]
fn test_edited_snapshot_disagrees_with_history() {
    let mut ward = seeded();
    let path = ward.snapshot_path();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, format!("{text}None\nNone\n7 P7 False []\n")).unwrap();

    ward.reopen();
    assert!(ward.ledger().get(7).is_some());
    let report = ward.ledger().audit().unwrap();
    assert!(!report.matches_live);
}

#[test]
fn test_failed_rollback_leaves_files_untouched() {
    let mut ward = seeded();
    let names = ward.entry_names();
    let snapshot = std::fs::read_to_string(ward.snapshot_path()).unwrap();
    let fingerprint = ward.ledger().fingerprint();
    ward.rewrite_entry(&names[0], |t| t.replace("P4", "X4"));

    assert!(ward.ledger().rollback(2).is_err());

    assert_eq!(std::fs::read_to_string(ward.snapshot_path()).unwrap(), snapshot);
    assert_eq!(ward.ledger().fingerprint(), fingerprint);
    assert_eq!(ward.entry_names(), names);
    assert!(ward.ledger().tree() != &PatientTree::new());
}
