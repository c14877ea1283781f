use std::sync::{Arc, RwLock};

use crate::data_source::read;
use crate::identifier::Identifiable;
use crate::snapshot::{IndexPath, Snapshot};

/// Cloneable read handle on a data source's live snapshot
///
/// View callbacks may query through a reader from any thread while an
/// apply is in flight; they observe either the structure before the
/// batch or the one after it, never a partial state.
pub struct SnapshotReader<S: Identifiable, I: Identifiable> {
    live: Arc<RwLock<Snapshot<S, I>>>,
}

impl<S: Identifiable, I: Identifiable> Clone for SnapshotReader<S, I> {
    fn clone(&self) -> Self {
        Self {
            live: Arc::clone(&self.live),
        }
    }
}

impl<S: Identifiable, I: Identifiable> SnapshotReader<S, I> {
    pub(crate) fn new(live: Arc<RwLock<Snapshot<S, I>>>) -> Self {
        Self { live }
    }

    /// An independent copy of the live snapshot
    pub fn snapshot(&self) -> Snapshot<S, I> {
        read(&self.live).clone()
    }

    pub fn number_of_sections(&self) -> usize {
        read(&self.live).number_of_sections()
    }

    /// Items in the section at `section`; 0 if there is no such section
    pub fn number_of_items(&self, section: usize) -> usize {
        read(&self.live)
            .sections()
            .get(section)
            .map_or(0, |s| s.items().len())
    }

    pub fn item_identifier(&self, path: IndexPath) -> Option<I> {
        read(&self.live).item_at(path).cloned()
    }

    pub fn index_path(&self, item: &I) -> Option<IndexPath> {
        read(&self.live).index_path(item)
    }

    pub fn section_identifier(&self, index: usize) -> Option<S> {
        read(&self.live).section_at(index).cloned()
    }

    pub fn index_of_section(&self, section: &S) -> Option<usize> {
        read(&self.live).index_of_section(section)
    }
}
