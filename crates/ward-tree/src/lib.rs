//! Self-balancing patient tree.
//!
//! [`PatientTree`] is an AVL tree keyed by patient id. Every node exclusively
//! owns its children; there are no parent pointers and no shared ownership.
//!
//! Two derived views of a tree matter for the mutation log:
//!
//! - [`Snapshot`]: the level-order serialization persisted between runs.
//! - [`fingerprint`]: a SHA-256 hash over the level-order code sequence,
//!   sensitive to both the records and the exact shape of the tree.

pub mod fingerprint;
mod node;
mod snapshot;
mod tree;

#[cfg(test)]
mod tests;

pub use fingerprint::{ABSENCE_MARKER, fingerprint, level_order_codes, node_code};
pub use snapshot::{Slot, Snapshot};
pub use tree::{InvariantViolation, Iter, PatientTree, RotationStats};
