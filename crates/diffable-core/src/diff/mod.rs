//! Snapshot diff engine.
//!
//! Compares two snapshots and produces a structured, deterministic
//! [`Changeset`] suitable for driving a batch of view updates.
//!
//! ## Entry point
//!
//! ```
//! use diffable_core::{diff::diff, Snapshot};
//!
//! let old: Snapshot<&str, u32> = Snapshot::from_sections([("a", vec![1, 2, 3])]).unwrap();
//! let new: Snapshot<&str, u32> = Snapshot::from_sections([("a", vec![1, 3, 2])]).unwrap();
//!
//! let changeset = diff(&old, &new);
//! assert_eq!(changeset.item_moves.len(), 1);
//! let summary = diffable_core::diff::render_summary(&changeset);
//! assert!(summary.contains("Item Moves"));
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs produce identical changesets.
//! - **Frozen indexing**: deletions use old positions, insertions new ones;
//!   nothing is re-indexed mid-computation.
//! - **No churn**: an identifier present on both sides is never reported as
//!   a deletion plus an insertion.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::{diff, DiffEngine, Differ};
pub use human_summary::render_summary;
pub use model::{Changeset, Deletion, Insertion, Move, Reload};
