//! Content-and-shape fingerprinting of a tree.
//!
//! Each node is reduced to a short code (see [`node_code`]). The codes are
//! collected breadth-first with an explicit marker for every absent child
//! position, so the sequence depends on the exact shape and not only on the
//! set of records. The fingerprint is SHA-256 over the comma-joined sequence.

use ward_types::{Fingerprint, PatientData};

use crate::tree::PatientTree;

/// Literal used for an absent child, both in code sequences and snapshot files.
pub const ABSENCE_MARKER: &str = "None";

const EMPTY_PLACEHOLDER: char = '_';

/// Short per-record code: decimal id, uppercase initial of the name, `T`/`F`,
/// then the lowercase initial of every disease.
///
/// An empty name or an empty disease list contributes `_` instead.
pub fn node_code(record: &PatientData) -> String {
    let mut code = record.id.to_string();

    match record.name.chars().next() {
        Some(initial) => code.extend(initial.to_uppercase()),
        None => code.push(EMPTY_PLACEHOLDER),
    }

    code.push(if record.cured { 'T' } else { 'F' });

    if record.diseases.is_empty() {
        code.push(EMPTY_PLACEHOLDER);
    } else {
        for disease in &record.diseases {
            if let Some(initial) = disease.chars().next() {
                code.extend(initial.to_lowercase());
            }
        }
    }

    code
}

/// Breadth-first code sequence including every absence marker.
pub fn level_order_codes(tree: &PatientTree) -> Vec<String> {
    tree.level_order()
        .into_iter()
        .map(|slot| match slot {
            Some(record) => node_code(record),
            None => ABSENCE_MARKER.to_string(),
        })
        .collect()
}

/// Hash of a code sequence, as used for tree fingerprints.
pub fn hash_codes<S: AsRef<str>>(codes: &[S]) -> Fingerprint {
    let joined = codes
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",");
    Fingerprint::from_data(joined.as_bytes())
}

/// SHA-256 over the comma-joined [`level_order_codes`] of `tree`.
///
/// The empty tree hashes the empty string.
pub fn fingerprint(tree: &PatientTree) -> Fingerprint {
    hash_codes(&level_order_codes(tree))
}
