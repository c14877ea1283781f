//! Changeset output types.
//!
//! Deletions and move sources are positions in the OLD snapshot; insertions,
//! move targets and reload targets are positions in the NEW snapshot. Each
//! list is emitted in a fixed order so that a given pair of snapshots always
//! produces the same changeset.

use serde::{Deserialize, Serialize};

use crate::snapshot::IndexPath;

/// An identifier removed at `source` (old coordinates)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion<T, P> {
    pub id: T,
    pub source: P,
}

/// An identifier added at `target` (new coordinates)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insertion<T, P> {
    pub id: T,
    pub target: P,
}

/// An identifier present on both sides whose position changed beyond what
/// surrounding inserts and deletes explain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move<T, P> {
    pub id: T,
    pub source: P,
    pub target: P,
}

/// An identifier present on both sides whose content must be refreshed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reload<T, P> {
    pub id: T,
    pub source: P,
    pub target: P,
}

/// The delta between two snapshots.
///
/// Section and item deltas are independent: items of a deleted section are
/// not listed as item deletions, items of an inserted section are not listed
/// as item insertions. An identifier never appears in both a deletion and an
/// insertion list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changeset<S, I> {
    /// Old order
    pub section_deletes: Vec<Deletion<S, usize>>,
    /// New order
    pub section_inserts: Vec<Insertion<S, usize>>,
    /// New target order
    pub section_moves: Vec<Move<S, usize>>,
    /// New target order
    pub section_reloads: Vec<Reload<S, usize>>,
    /// Old order
    pub item_deletes: Vec<Deletion<I, IndexPath>>,
    /// New order
    pub item_inserts: Vec<Insertion<I, IndexPath>>,
    /// New target order
    pub item_moves: Vec<Move<I, IndexPath>>,
    /// New target order
    pub item_reloads: Vec<Reload<I, IndexPath>>,
}

impl<S, I> Default for Changeset<S, I> {
    fn default() -> Self {
        Self {
            section_deletes: Vec::new(),
            section_inserts: Vec::new(),
            section_moves: Vec::new(),
            section_reloads: Vec::new(),
            item_deletes: Vec::new(),
            item_inserts: Vec::new(),
            item_moves: Vec::new(),
            item_reloads: Vec::new(),
        }
    }
}

impl<S, I> Changeset<S, I> {
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    /// Total number of entries across all lists
    pub fn change_count(&self) -> usize {
        self.section_deletes.len()
            + self.section_inserts.len()
            + self.section_moves.len()
            + self.section_reloads.len()
            + self.item_deletes.len()
            + self.item_inserts.len()
            + self.item_moves.len()
            + self.item_reloads.len()
    }

    /// Whether anything other than reloads changed
    pub fn has_structural_changes(&self) -> bool {
        !(self.section_deletes.is_empty()
            && self.section_inserts.is_empty()
            && self.section_moves.is_empty()
            && self.item_deletes.is_empty()
            && self.item_inserts.is_empty()
            && self.item_moves.is_empty())
    }
}
