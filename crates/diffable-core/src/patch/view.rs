//! The view collaborator, specified at the interface the core needs.

use crate::snapshot::IndexPath;

/// Signal fired by the view once a batch has been committed
pub type BatchCompletion = Box<dyn FnOnce() + Send + 'static>;

/// Primitive mutation calls a view accepts inside a batch
///
/// Deletions and move sources are pre-batch coordinates; insertions, move
/// targets and reloads are post-batch coordinates.
pub trait BatchUpdates {
    fn delete_items(&mut self, index_paths: &[IndexPath]);
    fn delete_sections(&mut self, sections: &[usize]);
    fn insert_sections(&mut self, sections: &[usize]);
    fn insert_items(&mut self, index_paths: &[IndexPath]);
    fn move_section(&mut self, from: usize, to: usize);
    fn move_item(&mut self, from: IndexPath, to: IndexPath);
    fn reload_sections(&mut self, sections: &[usize]);
    fn reload_items(&mut self, index_paths: &[IndexPath]);
}

/// A sectioned list or grid view
pub trait ListView: BatchUpdates {
    /// What the cell provider produces for one coordinate
    type Cell;
    /// What the supplementary view provider produces (headers, footers, ...)
    type SupplementaryView;

    /// Whether batched updates are currently possible
    ///
    /// A view that cannot batch (for example one that is not on screen)
    /// gets a full [`reload_data`](Self::reload_data) instead.
    fn supports_batch_updates(&self) -> bool {
        true
    }

    /// Run `updates` as one atomic batch, then fire `completion` exactly once
    ///
    /// `updates` must be called exactly once, before `completion`.
    /// `completion` may fire synchronously or later on another thread.
    fn perform_batch_updates(
        &mut self,
        animated: bool,
        updates: &mut dyn FnMut(&mut dyn BatchUpdates),
        completion: BatchCompletion,
    );

    /// Discard all displayed state and re-query the data source
    fn reload_data(&mut self);
}
