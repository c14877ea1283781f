//! Patch applicator: turns a [`Changeset`](crate::diff::Changeset) into one
//! ordered batch of view mutation calls.
//!
//! ## Ordering contract
//!
//! Within one batch, calls are issued in this order:
//!
//! 1. delete items (old coordinates)
//! 2. delete sections (old indices)
//! 3. insert sections (new indices)
//! 4. insert items (new coordinates)
//! 5. move sections (old index -> new index)
//! 6. move items (old coordinates -> new coordinates)
//! 7. reload items, then reload sections (new coordinates)
//!
//! after which the backing structure is swapped, still inside the batch.

pub mod applicator;
pub mod view;

pub use applicator::{apply, issue_updates, PatchOutcome};
pub use view::{BatchCompletion, BatchUpdates, ListView};
