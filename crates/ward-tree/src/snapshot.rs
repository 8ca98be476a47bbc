//! Level-order snapshot of a tree, as persisted between runs.
//!
//! A snapshot lists the breadth-first positions of a tree with an
//! [`ABSENCE_MARKER`] line for each missing child, and the trailing run of
//! markers trimmed. Restoring replays every record through
//! [`PatientTree::insert`], so the recorded shape is only reproduced when
//! that insertion order, combined with rebalancing, rebuilds it. That holds
//! for any snapshot of a balanced tree; a hand-made unbalanced layout is
//! rebalanced on restore.

use tracing::warn;
use ward_types::{PatientData, line};

use crate::fingerprint::{ABSENCE_MARKER, node_code};
use crate::tree::PatientTree;

/// One breadth-first position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Record(PatientData),
    Absent,
}

/// Level-order serialization of a [`PatientTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    slots: Vec<Slot>,
}

impl Snapshot {
    /// Capture the level-order layout of `tree`, trimming trailing markers.
    pub fn capture(tree: &PatientTree) -> Self {
        let mut slots: Vec<Slot> = tree
            .level_order()
            .into_iter()
            .map(|slot| match slot {
                Some(record) => Slot::Record(record.clone()),
                None => Slot::Absent,
            })
            .collect();

        while matches!(slots.last(), Some(Slot::Absent)) {
            slots.pop();
        }

        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Records in snapshot order, markers skipped.
    pub fn records(&self) -> impl Iterator<Item = &PatientData> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Record(record) => Some(record),
            Slot::Absent => None,
        })
    }

    /// The raw code sequence of the recorded layout, without re-inserting.
    ///
    /// For a captured snapshot this equals the tree's level-order code
    /// sequence up to and including its last real node.
    pub fn codes(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Record(record) => node_code(record),
                Slot::Absent => ABSENCE_MARKER.to_string(),
            })
            .collect()
    }

    /// Rebuild a tree by inserting every record in snapshot order.
    pub fn restore(&self) -> PatientTree {
        let mut tree = PatientTree::new();
        for record in self.records() {
            if !tree.insert(record.clone()) {
                warn!(id = record.id, "duplicate id in snapshot, keeping the first");
            }
        }
        tree
    }

    /// Render as text: one line per slot, newline-terminated.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for slot in &self.slots {
            match slot {
                Slot::Record(record) => out.push_str(&line::encode(record)),
                Slot::Absent => out.push_str(ABSENCE_MARKER),
            }
            out.push('\n');
        }
        out
    }

    /// Parse snapshot text. Blank lines are ignored; malformed lines are
    /// skipped with a warning.
    pub fn parse(text: &str) -> Self {
        let mut slots = Vec::new();

        for (line_no, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == ABSENCE_MARKER {
                slots.push(Slot::Absent);
                continue;
            }
            match line::decode(raw) {
                Ok(record) => slots.push(Slot::Record(record)),
                Err(e) => warn!(line = line_no + 1, %e, "skipping malformed snapshot line"),
            }
        }

        Self { slots }
    }
}

impl From<&PatientTree> for Snapshot {
    fn from(tree: &PatientTree) -> Self {
        Self::capture(tree)
    }
}
