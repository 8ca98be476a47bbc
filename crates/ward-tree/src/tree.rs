//! Core AVL tree implementation.

use std::cmp::Ordering;
use std::collections::VecDeque;

use ward_types::{Fingerprint, PatientData, PatientId, PatientPatch};

use crate::node::{Link, Node, height, rebalance};

/// Counts of rotations performed by a tree since it was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationStats {
    pub left: u64,
    pub right: u64,
}

/// First structural invariant found broken by [`PatientTree::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// An id sits on the wrong side of an ancestor (or is duplicated).
    #[error("id {id} violates search ordering")]
    Unordered { id: PatientId },

    /// Subtree heights differ by more than one.
    #[error("node {id} is unbalanced (balance {balance})")]
    Unbalanced { id: PatientId, balance: i64 },

    /// Stored height disagrees with the subtree it heads.
    #[error("node {id} stores height {stored}, actual {actual}")]
    WrongHeight {
        id: PatientId,
        stored: u32,
        actual: u32,
    },

    /// The cached length disagrees with the node count.
    #[error("tree reports {reported} records but holds {actual}")]
    WrongLength { reported: usize, actual: usize },
}

/// AVL tree of patient records keyed by id.
///
/// The tree owns its root; callers pass the tree itself around instead of
/// sharing a root handle.
#[derive(Debug, Clone, Default)]
pub struct PatientTree {
    root: Link,
    len: usize,
    rotations: RotationStats,
}

impl PartialEq for PatientTree {
    /// Two trees are equal when they hold the same records in the same shape.
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for PatientTree {}

impl PatientTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the whole tree (0 when empty).
    pub fn height(&self) -> u32 {
        height(&self.root)
    }

    /// Rotations performed so far.
    pub fn rotations(&self) -> RotationStats {
        self.rotations
    }

    /// Record at the root, if any.
    pub fn root(&self) -> Option<&PatientData> {
        self.root.as_ref().map(|n| &n.record)
    }

    /// Insert `record`, rebalancing every ancestor on the way back up.
    ///
    /// Returns `false` and leaves the tree untouched if the id is already present.
    pub fn insert(&mut self, record: PatientData) -> bool {
        let (root, inserted) = insert_node(self.root.take(), record, &mut self.rotations);
        self.root = Some(root);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Remove the record with `id`, returning it if it was present.
    ///
    /// A node with two children takes over its in-order successor's record;
    /// the successor is then removed from the right subtree.
    pub fn remove(&mut self, id: PatientId) -> Option<PatientData> {
        let (root, removed) = remove_node(self.root.take(), id, &mut self.rotations);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Look up a record by id.
    pub fn search(&self, id: PatientId) -> Option<&PatientData> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            cur = match id.cmp(&node.record.id) {
                Ordering::Equal => return Some(&node.record),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }

    pub fn contains(&self, id: PatientId) -> bool {
        self.search(id).is_some()
    }

    /// Overwrite the fields supplied in `patch` on the record with `id`.
    ///
    /// Never changes the shape of the tree. Returns whether the id was found.
    pub fn update(&mut self, id: PatientId, patch: &PatientPatch) -> bool {
        match self.search_mut(id) {
            Some(record) => {
                record.apply(patch);
                true
            }
            None => false,
        }
    }

    /// In-order iterator over all records (ascending id).
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    /// Breadth-first positions starting at the root.
    ///
    /// Every dequeued position yields `Some(record)` for a node (whose two
    /// child positions are then enqueued) or `None` for an absent child. The
    /// sequence therefore ends with the absent children of the last level.
    /// An empty tree yields nothing.
    pub fn level_order(&self) -> Vec<Option<&PatientData>> {
        let mut out = Vec::new();
        let mut queue: VecDeque<Option<&Node>> = VecDeque::new();
        if let Some(root) = self.root.as_deref() {
            queue.push_back(Some(root));
        }

        while let Some(slot) = queue.pop_front() {
            match slot {
                Some(node) => {
                    out.push(Some(&node.record));
                    queue.push_back(node.left.as_deref());
                    queue.push_back(node.right.as_deref());
                }
                None => out.push(None),
            }
        }

        out
    }

    /// Content-and-shape hash of the current state.
    pub fn fingerprint(&self) -> Fingerprint {
        crate::fingerprint::fingerprint(self)
    }

    /// Check every structural invariant: search ordering, unique ids, the
    /// AVL balance bound, stored heights and the cached length.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let mut count = 0;
        validate_node(&self.root, None, None, &mut count)?;
        if count != self.len {
            return Err(InvariantViolation::WrongLength {
                reported: self.len,
                actual: count,
            });
        }
        Ok(())
    }

    // ----- Internal -----

    fn search_mut(&mut self, id: PatientId) -> Option<&mut PatientData> {
        let mut cur = self.root.as_deref_mut();
        while let Some(node) = cur {
            cur = match id.cmp(&node.record.id) {
                Ordering::Equal => return Some(&mut node.record),
                Ordering::Less => node.left.as_deref_mut(),
                Ordering::Greater => node.right.as_deref_mut(),
            };
        }
        None
    }
}

impl<'a> IntoIterator for &'a PatientTree {
    type Item = &'a PatientData;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator returned by [`PatientTree::iter`].
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn push_left(&mut self, mut cur: Option<&'a Node>) {
        while let Some(node) = cur {
            self.stack.push(node);
            cur = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a PatientData;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some(&node.record)
    }
}

fn insert_node(link: Link, record: PatientData, stats: &mut RotationStats) -> (Box<Node>, bool) {
    let Some(mut node) = link else {
        return (Node::leaf(record), true);
    };

    let inserted = match record.id.cmp(&node.record.id) {
        Ordering::Less => {
            let (child, inserted) = insert_node(node.left.take(), record, stats);
            node.left = Some(child);
            inserted
        }
        Ordering::Greater => {
            let (child, inserted) = insert_node(node.right.take(), record, stats);
            node.right = Some(child);
            inserted
        }
        Ordering::Equal => return (node, false),
    };

    node.update_height();
    (rebalance(node, stats), inserted)
}

fn remove_node(
    link: Link,
    id: PatientId,
    stats: &mut RotationStats,
) -> (Link, Option<PatientData>) {
    let Some(mut node) = link else {
        return (None, None);
    };

    let removed = match id.cmp(&node.record.id) {
        Ordering::Less => {
            let (child, removed) = remove_node(node.left.take(), id, stats);
            node.left = child;
            removed
        }
        Ordering::Greater => {
            let (child, removed) = remove_node(node.right.take(), id, stats);
            node.right = child;
            removed
        }
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (None, right) => return (right, Some(node.record)),
            (left, None) => return (left, Some(node.record)),
            (Some(left), Some(right)) => {
                let successor_id = leftmost(&right).record.id;
                let (rest, successor) = remove_node(Some(right), successor_id, stats);
                node.left = Some(left);
                node.right = rest;
                successor.map(|s| std::mem::replace(&mut node.record, s))
            }
        },
    };

    if removed.is_none() {
        return (Some(node), None);
    }

    node.update_height();
    (Some(rebalance(node, stats)), removed)
}

fn leftmost(mut node: &Node) -> &Node {
    while let Some(left) = node.left.as_deref() {
        node = left;
    }
    node
}

/// Returns the subtree height after checking it.
fn validate_node(
    link: &Link,
    lower: Option<PatientId>,
    upper: Option<PatientId>,
    count: &mut usize,
) -> Result<u32, InvariantViolation> {
    let Some(node) = link else {
        return Ok(0);
    };
    let id = node.record.id;

    if lower.is_some_and(|lo| id <= lo) || upper.is_some_and(|hi| id >= hi) {
        return Err(InvariantViolation::Unordered { id });
    }
    *count += 1;

    let lh = validate_node(&node.left, lower, Some(id), count)?;
    let rh = validate_node(&node.right, Some(id), upper, count)?;

    let balance = i64::from(lh) - i64::from(rh);
    if balance.abs() > 1 {
        return Err(InvariantViolation::Unbalanced { id, balance });
    }

    let actual = 1 + lh.max(rh);
    if node.height != actual {
        return Err(InvariantViolation::WrongHeight {
            id,
            stored: node.height,
            actual,
        });
    }

    Ok(actual)
}

#[cfg(test)]
impl PatientTree {
    /// Build a tree with an arbitrary (possibly unbalanced) shape for tests.
    pub(crate) fn from_raw_root(root: Link) -> Self {
        fn count(link: &Link) -> usize {
            link.as_ref()
                .map_or(0, |n| 1 + count(&n.left) + count(&n.right))
        }
        let len = count(&root);
        Self {
            root,
            len,
            rotations: RotationStats::default(),
        }
    }
}
