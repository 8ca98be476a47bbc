//! Tests for the ward-tree crate.


use ward_types::PatientData;

use crate::tree::PatientTree;

/// Minimal record with a generated name.
fn rec(id: i64) -> PatientData {
    PatientData::new(id, format!("P{id}"), false, Vec::<String>::new())
}

/// Tree built by inserting `ids` in order.
fn tree_of(ids: &[i64]) -> PatientTree {
    let mut tree = PatientTree::new();
    for &id in ids {
        tree.insert(rec(id));
    }
    tree
}

/// Ids in breadth-first order, `None` for absent positions.
fn shape(tree: &PatientTree) -> Vec<Option<i64>> {
    tree.level_order()
        .into_iter()
        .map(|slot| slot.map(|r| r.id))
        .collect()
}
