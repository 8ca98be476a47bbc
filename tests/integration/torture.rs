//! Long mixed workloads: many mutations, periodic restarts, rollbacks under
//! the archive policy, and verification after every phase.

use ward_integration_tests::{TestWard, Workload};
use ward_ledger::{LedgerConfig, RollbackPolicy};
use ward_log::ReplayOptions;

#[test]
fn test_long_session_with_rollbacks_and_restarts() {
    let config = LedgerConfig {
        replay: ReplayOptions {
            strict_updates: true,
        },
        rollback_policy: RollbackPolicy::Archive,
    };
    let mut ward = TestWard::new(config);
    let mut workload = Workload::new(0xDEAD_BEEF);
    let mut expected_entries = 0;

    for round in 0..10 {
        workload.run(&mut ward, 100, 64);
        expected_entries += 100;

        ward.ledger().tree().validate().unwrap();
        let audit = ward.ledger().audit().unwrap();
        assert!(audit.is_clean(), "round {round}: {audit:?}");
        assert_eq!(audit.entries, expected_entries);

        if round % 3 == 2 {
            let steps = 10 + round;
            let report = ward.ledger().rollback(steps).unwrap();
            assert_eq!(report.archived, steps);
            expected_entries -= steps;
        }
        if round % 2 == 1 {
            ward.reopen();
        }
    }

    let audit = ward.ledger().audit().unwrap();
    assert!(audit.is_clean());
    assert_eq!(audit.entries, expected_entries);
    assert_eq!(ward.entry_names().len(), expected_entries);
}

#[test]
fn test_dense_id_space_churn() {
    // Few ids and many operations: lots of removals down to tiny trees.
    let mut ward = TestWard::new(LedgerConfig::default());
    Workload::new(42).run(&mut ward, 500, 4);

    ward.ledger().tree().validate().unwrap();
    assert!(ward.ledger().tree().len() <= 4);
    let audit = ward.ledger().audit().unwrap();
    assert!(audit.is_clean());
    assert_eq!(audit.entries, 500);
}

#[test]
fn test_wide_tree_stays_balanced() {
    let mut ward = TestWard::new(LedgerConfig::default());
    Workload::new(9).run(&mut ward, 600, 100_000);

    let tree = ward.ledger().tree();
    tree.validate().unwrap();
    let n = tree.len() as f64;
    assert!(f64::from(tree.height()) < 1.45 * (n + 2.0).log2());

    ward.reopen();
    assert!(ward.ledger().audit().unwrap().is_clean());
}
