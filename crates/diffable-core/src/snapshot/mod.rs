//! Snapshot structure: ordered sections of ordered item identifiers
//!
//! A [`Snapshot`] is a value. Clones share storage until one of them is
//! mutated, at which point the mutated clone takes a private copy, so no
//! mutation is ever observable through another clone.

pub mod index_path;
pub mod structure;

pub use index_path::IndexPath;
pub use structure::{Section, Snapshot};
