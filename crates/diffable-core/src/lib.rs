//! Diffable Core - snapshot-driven data source for sectioned list views
//!
//! This crate provides:
//! - An immutable-by-value, copy-on-write snapshot of ordered sections and
//!   items with O(1) identifier lookups
//! - A deterministic differ producing a changeset of deletions, insertions,
//!   moves and reloads for sections and items
//! - A patch applicator issuing one ordered batch of view mutation calls
//! - A data source facade answering view queries and serializing applies

pub mod data_source;
pub mod diff;
pub mod errors;
pub mod identifier;
pub mod logging_facility;
pub mod patch;
pub mod policy;
pub mod snapshot;

// Re-export commonly used types
pub use data_source::{
    ApplyCompletion, CellProvider, DataSourceOptions, DiffableDataSource, SnapshotReader,
    SupplementaryViewProvider,
};
pub use diff::{diff, Changeset, DiffEngine, Differ};
pub use errors::{DiffableError, ExError, ExErrorKind, Result};
pub use identifier::{Identifiable, Keyed};
pub use patch::{BatchCompletion, BatchUpdates, ListView, PatchOutcome};
pub use policy::ReloadPolicy;
pub use snapshot::{IndexPath, Section, Snapshot};

pub use diffable_core_types as core_types;

#[doc(hidden)]
pub mod __private {
    pub use diffable_core_types::schema;
    pub use tracing;
}
