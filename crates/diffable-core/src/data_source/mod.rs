//! Data source facade
//!
//! [`DiffableDataSource`] owns the live snapshot and the view. It answers
//! the view's count and lookup queries, builds cells through the
//! application's provider, and turns `apply(snapshot)` into one diff plus
//! one batch, serialized against other applies.

pub mod options;
mod queue;
pub mod reader;

use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use diffable_core_types::RequestId;

use crate::errors::{DiffableError, Result};
use crate::identifier::Identifiable;
use crate::log_op_error;
use crate::patch::ListView;
use crate::snapshot::{IndexPath, Snapshot};

pub use options::DataSourceOptions;
pub use queue::ApplyCompletion;
pub use reader::SnapshotReader;

use queue::{ApplyQueue, PendingApply, Shared, ViewHold};

/// Builds the cell for one coordinate from the current item identifier
pub type CellProvider<V, I> =
    Box<dyn Fn(&V, IndexPath, &I) -> Option<<V as ListView>::Cell> + Send + Sync>;

/// Builds a supplementary view (header, footer, ...) of the given kind
pub type SupplementaryViewProvider<V> =
    Box<dyn Fn(&V, &str, IndexPath) -> Option<<V as ListView>::SupplementaryView> + Send + Sync>;

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sectioned list data source driven by snapshots
///
/// ```
/// use diffable_core::{BatchCompletion, BatchUpdates, DiffableDataSource, IndexPath, ListView, Snapshot};
///
/// struct Table { rows: usize }
///
/// impl BatchUpdates for Table {
///     fn delete_items(&mut self, p: &[IndexPath]) { self.rows -= p.len(); }
///     fn delete_sections(&mut self, _: &[usize]) {}
///     fn insert_sections(&mut self, _: &[usize]) {}
///     fn insert_items(&mut self, p: &[IndexPath]) { self.rows += p.len(); }
///     fn move_section(&mut self, _: usize, _: usize) {}
///     fn move_item(&mut self, _: IndexPath, _: IndexPath) {}
///     fn reload_sections(&mut self, _: &[usize]) {}
///     fn reload_items(&mut self, _: &[IndexPath]) {}
/// }
///
/// impl ListView for Table {
///     type Cell = String;
///     type SupplementaryView = ();
///     fn perform_batch_updates(
///         &mut self,
///         _animated: bool,
///         updates: &mut dyn FnMut(&mut dyn BatchUpdates),
///         completion: BatchCompletion,
///     ) {
///         updates(self);
///         completion();
///     }
///     fn reload_data(&mut self) {}
/// }
///
/// let source: DiffableDataSource<&str, u32, Table> = DiffableDataSource::new(
///     Table { rows: 0 },
///     Box::new(|_: &Table, _path: IndexPath, item: &u32| Some(format!("row {}", item))),
/// );
///
/// let mut snapshot = Snapshot::new();
/// snapshot.append_sections(["main"]).unwrap();
/// snapshot.append_items([1, 2, 3], None).unwrap();
/// source.apply(snapshot, false);
///
/// assert_eq!(source.number_of_items(0), 3);
/// assert_eq!(source.with_view(|table| table.rows), 3);
/// ```
pub struct DiffableDataSource<S: Identifiable, I: Identifiable, V: ListView> {
    shared: Arc<Shared<S, I, V>>,
    cell_provider: CellProvider<V, I>,
    supplementary_provider: Option<SupplementaryViewProvider<V>>,
    default_animation: bool,
}

impl<S, I, V> DiffableDataSource<S, I, V>
where
    S: Identifiable + Send + Sync + 'static,
    S::Id: Send + Sync,
    I: Identifiable + Send + Sync + 'static,
    I::Id: Send + Sync,
    V: ListView + Send + 'static,
{
    /// Data source over `view` with the built-in differ
    pub fn new(view: V, cell_provider: CellProvider<V, I>) -> Self {
        Self::with_options(view, DataSourceOptions::default(), cell_provider)
    }

    pub fn with_options(
        view: V,
        options: DataSourceOptions<S, I>,
        cell_provider: CellProvider<V, I>,
    ) -> Self {
        let default_animation = options.default_animation();
        let shared = Shared {
            live: Arc::new(RwLock::new(Snapshot::new())),
            view: Mutex::new(view),
            engine: options.into_engine(),
            queue: Mutex::new(ApplyQueue::default()),
        };
        Self {
            shared: Arc::new(shared),
            cell_provider,
            supplementary_provider: None,
            default_animation,
        }
    }

    pub fn set_supplementary_view_provider(&mut self, provider: SupplementaryViewProvider<V>) {
        self.supplementary_provider = Some(provider);
    }

    // ===== Apply =====

    /// Make `snapshot` the displayed structure
    ///
    /// With `animate = false` and a view that completes synchronously, the
    /// view and the live snapshot are updated before this returns. An apply
    /// issued while another is in flight is queued and diffed against the
    /// structure its predecessor produces.
    pub fn apply(&self, snapshot: Snapshot<S, I>, animate: bool) {
        self.enqueue(snapshot, animate, None);
    }

    /// [`apply`](Self::apply) with the animation flag from
    /// [`DataSourceOptions::with_default_animation`] (animated unless configured otherwise)
    pub fn apply_default(&self, snapshot: Snapshot<S, I>) {
        self.enqueue(snapshot, self.default_animation, None);
    }

    /// As [`apply`](Self::apply), then run `completion` once the batch for
    /// this snapshot has been committed
    pub fn apply_with_completion(
        &self,
        snapshot: Snapshot<S, I>,
        animate: bool,
        completion: ApplyCompletion,
    ) {
        self.enqueue(snapshot, animate, Some(completion));
    }

    fn enqueue(&self, snapshot: Snapshot<S, I>, animate: bool, completion: Option<ApplyCompletion>) {
        let job = PendingApply {
            request_id: RequestId::new(),
            snapshot,
            animate,
            completion,
        };
        Shared::enqueue(&self.shared, job);
    }

    /// Applies that have not completed yet, including the one in flight
    pub fn pending_applies(&self) -> usize {
        lock(&self.shared.queue).outstanding()
    }

    /// Name of the diff engine in use
    pub fn engine_name(&self) -> &'static str {
        self.shared.engine.name()
    }

    // ===== Queries =====

    /// An independent copy of the live snapshot
    pub fn snapshot(&self) -> Snapshot<S, I> {
        read(&self.shared.live).clone()
    }

    /// Cloneable read handle for view callbacks on other threads
    pub fn reader(&self) -> SnapshotReader<S, I> {
        SnapshotReader::new(Arc::clone(&self.shared.live))
    }

    pub fn number_of_sections(&self) -> usize {
        read(&self.shared.live).number_of_sections()
    }

    /// Items in the section at `section`; 0 if there is no such section
    pub fn number_of_items(&self, section: usize) -> usize {
        read(&self.shared.live)
            .sections()
            .get(section)
            .map_or(0, |s| s.items().len())
    }

    pub fn item_identifier(&self, path: IndexPath) -> Option<I> {
        read(&self.shared.live).item_at(path).cloned()
    }

    pub fn index_path(&self, item: &I) -> Option<IndexPath> {
        read(&self.shared.live).index_path(item)
    }

    pub fn section_identifier(&self, index: usize) -> Option<S> {
        read(&self.shared.live).section_at(index).cloned()
    }

    pub fn index_of_section(&self, section: &S) -> Option<usize> {
        read(&self.shared.live).index_of_section(section)
    }

    /// Run `f` with exclusive access to the view
    ///
    /// An `apply` issued from inside `f` is queued and runs after `f`
    /// returns and the view is released.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut V) -> R) -> R {
        let result = {
            let mut view = lock(&self.shared.view);
            let _hold = ViewHold::new(&self.shared.queue);
            f(&mut view)
        };
        Shared::drain(&self.shared);
        result
    }

    // ===== View callbacks =====

    /// Build the cell for `path` through the cell provider
    ///
    /// # Errors
    ///
    /// `InvalidIndexPath` if the live snapshot has no item at `path`;
    /// `CellProviderReturnedNone` if the provider produced nothing.
    pub fn cell(&self, view: &V, path: IndexPath) -> Result<V::Cell> {
        let start = Instant::now();
        let item = match self.item_identifier(path) {
            Some(item) => item,
            None => {
                let err = DiffableError::InvalidIndexPath {
                    section: path.section,
                    item: path.item,
                };
                log_op_error!("cell", err.clone(), duration_ms = elapsed_ms(start));
                return Err(err);
            }
        };

        match (self.cell_provider)(view, path, &item) {
            Some(cell) => Ok(cell),
            None => {
                let err = DiffableError::CellProviderReturnedNone {
                    section: path.section,
                    item: path.item,
                    item_id: format!("{:?}", item),
                };
                log_op_error!("cell", err.clone(), duration_ms = elapsed_ms(start));
                Err(err)
            }
        }
    }

    /// Build the supplementary view of `kind` for `path`
    ///
    /// `Ok(None)` when no supplementary provider is registered.
    ///
    /// # Errors
    ///
    /// `InvalidIndexPath` if the live snapshot has no section `path.section`;
    /// `SupplementaryProviderReturnedNone` if the provider produced nothing.
    pub fn supplementary_view(
        &self,
        view: &V,
        kind: &str,
        path: IndexPath,
    ) -> Result<Option<V::SupplementaryView>> {
        let Some(provider) = &self.supplementary_provider else {
            return Ok(None);
        };
        let start = Instant::now();

        if path.section >= self.number_of_sections() {
            let err = DiffableError::InvalidIndexPath {
                section: path.section,
                item: path.item,
            };
            log_op_error!(
                "supplementary_view",
                err.clone(),
                duration_ms = elapsed_ms(start)
            );
            return Err(err);
        }

        match provider(view, kind, path) {
            Some(supplementary) => Ok(Some(supplementary)),
            None => {
                let err = DiffableError::SupplementaryProviderReturnedNone {
                    kind: kind.to_string(),
                    section: path.section,
                    item: path.item,
                };
                log_op_error!(
                    "supplementary_view",
                    err.clone(),
                    duration_ms = elapsed_ms(start)
                );
                Err(err)
            }
        }
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
