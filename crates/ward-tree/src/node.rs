//! Tree node and the rotation/rebalance primitives.

use std::cmp::max;

use tracing::trace;
use ward_types::PatientData;

use crate::tree::RotationStats;

pub(crate) type Link = Option<Box<Node>>;

/// A single AVL node. Owns its record and both subtrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) record: PatientData,
    pub(crate) left: Link,
    pub(crate) right: Link,
    /// 1 for a leaf; 1 + max(child heights) otherwise.
    pub(crate) height: u32,
}

impl Node {
    pub(crate) fn leaf(record: PatientData) -> Box<Self> {
        Box::new(Self {
            record,
            left: None,
            right: None,
            height: 1,
        })
    }

    pub(crate) fn update_height(&mut self) {
        self.height = 1 + max(height(&self.left), height(&self.right));
    }

    pub(crate) fn balance(&self) -> i64 {
        i64::from(height(&self.left)) - i64::from(height(&self.right))
    }
}

/// Height of a possibly absent subtree (0 when absent).
pub(crate) fn height(link: &Link) -> u32 {
    link.as_ref().map_or(0, |n| n.height)
}

fn balance_of(link: &Link) -> i64 {
    link.as_ref().map_or(0, |n| n.balance())
}

/// Rotate `y` right around its left child. A node without a left child is
/// returned unchanged.
pub(crate) fn rotate_right(mut y: Box<Node>, stats: &mut RotationStats) -> Box<Node> {
    let Some(mut x) = y.left.take() else {
        return y;
    };
    trace!(pivot = y.record.id, "right rotation");
    stats.right += 1;

    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

/// Rotate `x` left around its right child. A node without a right child is
/// returned unchanged.
pub(crate) fn rotate_left(mut x: Box<Node>, stats: &mut RotationStats) -> Box<Node> {
    let Some(mut y) = x.right.take() else {
        return x;
    };
    trace!(pivot = x.record.id, "left rotation");
    stats.left += 1;

    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

/// Restore the AVL property at `node`, assuming both subtrees already satisfy it
/// and `node.height` is current.
pub(crate) fn rebalance(mut node: Box<Node>, stats: &mut RotationStats) -> Box<Node> {
    let balance = node.balance();

    if balance > 1 {
        if balance_of(&node.left) < 0 {
            node.left = node.left.take().map(|l| rotate_left(l, stats));
        }
        return rotate_right(node, stats);
    }

    if balance < -1 {
        if balance_of(&node.right) > 0 {
            node.right = node.right.take().map(|r| rotate_right(r, stats));
        }
        return rotate_left(node, stats);
    }

    node
}
