#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use diffable_core::{
    BatchCompletion, BatchUpdates, CellProvider, DataSourceOptions, DiffableDataSource,
    Identifiable, IndexPath, ListView, Snapshot, SnapshotReader,
};

/// How the mock view signals batch completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Completion fires before `perform_batch_updates` returns
    Inline,
    /// Completion is parked in the pump until the test fires it
    Deferred,
    /// Completion fires on a fresh thread shortly after the batch
    Threaded,
}

/// Parked batch completions, fired by the test outside every lock
#[derive(Clone, Default)]
pub struct CompletionPump {
    pending: Arc<Mutex<Vec<BatchCompletion>>>,
}

impl CompletionPump {
    pub fn push(&self, completion: BatchCompletion) {
        self.pending.lock().unwrap().push(completion);
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Fire the oldest parked completion; false if none was parked
    pub fn fire_one(&self) -> bool {
        let next = {
            let mut pending = self.pending.lock().unwrap();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };
        match next {
            Some(completion) => {
                completion();
                true
            }
            None => false,
        }
    }

    /// Fire parked completions until none are left (firing may park more)
    pub fn flush(&self) -> usize {
        let mut fired = 0;
        while self.fire_one() {
            fired += 1;
        }
        fired
    }
}

#[derive(Default)]
struct PendingBatch {
    item_deletes: Vec<IndexPath>,
    section_deletes: Vec<usize>,
    section_inserts: Vec<usize>,
    item_inserts: Vec<IndexPath>,
    section_moves: Vec<(usize, usize)>,
    item_moves: Vec<(IndexPath, IndexPath)>,
    section_reloads: Vec<usize>,
    item_reloads: Vec<IndexPath>,
}

#[derive(Debug, Clone, Copy)]
enum Origin<P> {
    Fresh,
    Old(P),
}

/// A list view double with batch semantics
///
/// At the end of each batch it rebuilds its rows the way a platform list
/// view does. Deletions and move sources are read in pre-batch
/// coordinates, insertions and move targets in post-batch coordinates.
/// Untouched rows keep their relative order. Every row it keeps must match
/// the data source's identity at its new position, and only inserted or
/// reloaded rows are re-read from the data source. A wrong changeset
/// therefore shows up as a panic or as a view that differs from the
/// snapshot.
pub struct MockView<S: Identifiable, I: Identifiable> {
    pub sections: Vec<(S, Vec<I>)>,
    pub calls: Vec<&'static str>,
    pub batches: usize,
    pub animated_batches: usize,
    pub full_reloads: usize,
    pub supports_batch: bool,
    mode: CompletionMode,
    pump: CompletionPump,
    reader: Option<SnapshotReader<S, I>>,
    pending: PendingBatch,
}

impl<S: Identifiable, I: Identifiable> MockView<S, I> {
    pub fn new(mode: CompletionMode, pump: CompletionPump) -> Self {
        Self {
            sections: Vec::new(),
            calls: Vec::new(),
            batches: 0,
            animated_batches: 0,
            full_reloads: 0,
            supports_batch: true,
            mode,
            pump,
            reader: None,
            pending: PendingBatch::default(),
        }
    }

    pub fn attach(&mut self, reader: SnapshotReader<S, I>) {
        self.reader = Some(reader);
    }

    fn live(&self) -> Snapshot<S, I> {
        self.reader
            .as_ref()
            .expect("view is not attached to a data source")
            .snapshot()
    }

    fn commit_batch(&mut self) {
        let batch = std::mem::take(&mut self.pending);
        let live = self.live();
        let old = std::mem::take(&mut self.sections);
        let new_sections = live.sections();

        // Sections
        let deleted_sections: HashSet<usize> = batch.section_deletes.iter().copied().collect();
        let moved_sections: HashSet<usize> = batch.section_moves.iter().map(|m| m.0).collect();
        for s in &deleted_sections {
            assert!(*s < old.len(), "delete of missing section {}", s);
            assert!(
                !moved_sections.contains(s),
                "section {} both deleted and moved",
                s
            );
        }

        let mut section_slots: Vec<Option<Origin<usize>>> = vec![None; new_sections.len()];
        for &t in &batch.section_inserts {
            assert!(t < section_slots.len(), "insert of section {} out of range", t);
            assert!(section_slots[t].is_none(), "section slot {} filled twice", t);
            section_slots[t] = Some(Origin::Fresh);
        }
        for &(from, to) in &batch.section_moves {
            assert!(from < old.len(), "move of missing section {}", from);
            assert!(to < section_slots.len(), "move of section to {} out of range", to);
            assert!(section_slots[to].is_none(), "section slot {} filled twice", to);
            section_slots[to] = Some(Origin::Old(from));
        }
        let mut stable_sections = (0..old.len())
            .filter(|s| !deleted_sections.contains(s) && !moved_sections.contains(s));
        for slot in section_slots.iter_mut().filter(|slot| slot.is_none()) {
            let s = stable_sections
                .next()
                .expect("more sections after the batch than it explains");
            *slot = Some(Origin::Old(s));
        }
        assert!(
            stable_sections.next().is_none(),
            "fewer sections after the batch than it explains"
        );

        // Items
        let deleted_items: HashSet<IndexPath> = batch.item_deletes.iter().copied().collect();
        let moved_items: HashSet<IndexPath> = batch.item_moves.iter().map(|m| m.0).collect();
        let old_item = |p: IndexPath| -> I {
            old.get(p.section)
                .and_then(|(_, items)| items.get(p.item))
                .cloned()
                .unwrap_or_else(|| panic!("no item at pre-batch {}", p))
        };
        for p in &deleted_items {
            old_item(*p);
            assert!(!moved_items.contains(p), "item {} both deleted and moved", p);
        }

        let mut inserts_by_section: HashMap<usize, Vec<usize>> = HashMap::new();
        for p in &batch.item_inserts {
            inserts_by_section.entry(p.section).or_default().push(p.item);
        }
        let mut moves_by_section: HashMap<usize, Vec<(usize, IndexPath)>> = HashMap::new();
        for &(from, to) in &batch.item_moves {
            moves_by_section
                .entry(to.section)
                .or_default()
                .push((to.item, from));
        }

        let mut rebuilt = Vec::with_capacity(new_sections.len());
        for (t, slot) in section_slots.into_iter().enumerate() {
            let origin = slot.expect("every section slot is filled");
            let target = &new_sections[t];
            let mut items: Vec<Option<Origin<IndexPath>>> = vec![None; target.items().len()];

            for &j in inserts_by_section.get(&t).into_iter().flatten() {
                assert!(
                    matches!(origin, Origin::Old(_)),
                    "item insert into inserted section {}",
                    t
                );
                assert!(j < items.len(), "insert at [{}, {}] out of range", t, j);
                assert!(items[j].is_none(), "item slot [{}, {}] filled twice", t, j);
                items[j] = Some(Origin::Fresh);
            }
            for &(j, from) in moves_by_section.get(&t).into_iter().flatten() {
                old_item(from);
                assert!(j < items.len(), "move to [{}, {}] out of range", t, j);
                assert!(items[j].is_none(), "item slot [{}, {}] filled twice", t, j);
                items[j] = Some(Origin::Old(from));
            }

            let (section_value, survivors) = match origin {
                Origin::Fresh => (target.id().clone(), Vec::new()),
                Origin::Old(s) => {
                    assert_eq!(
                        old[s].0.id(),
                        target.id().id(),
                        "section identity mismatch at {}",
                        t
                    );
                    let survivors: Vec<IndexPath> = (0..old[s].1.len())
                        .map(|i| IndexPath::new(s, i))
                        .filter(|p| !deleted_items.contains(p) && !moved_items.contains(p))
                        .collect();
                    (old[s].0.clone(), survivors)
                }
            };

            let mut survivors = survivors.into_iter();
            for slot in items.iter_mut().filter(|slot| slot.is_none()) {
                *slot = Some(match origin {
                    Origin::Fresh => Origin::Fresh,
                    Origin::Old(_) => Origin::Old(
                        survivors
                            .next()
                            .expect("more items after the batch than it explains"),
                    ),
                });
            }
            assert!(
                survivors.next().is_none(),
                "fewer items in section {} after the batch than it explains",
                t
            );

            let values: Vec<I> = items
                .into_iter()
                .enumerate()
                .map(|(j, slot)| match slot.expect("every item slot is filled") {
                    Origin::Fresh => target.items()[j].clone(),
                    Origin::Old(from) => {
                        let value = old_item(from);
                        assert_eq!(
                            value.id(),
                            target.items()[j].id(),
                            "item identity mismatch at [{}, {}]",
                            t,
                            j
                        );
                        value
                    }
                })
                .collect();
            rebuilt.push((section_value, values));
        }

        for &s in &batch.section_reloads {
            let target = new_sections
                .get(s)
                .unwrap_or_else(|| panic!("reload of section {} out of range", s));
            rebuilt[s] = (target.id().clone(), target.items().to_vec());
        }
        for &p in &batch.item_reloads {
            let value = live
                .item_at(p)
                .unwrap_or_else(|| panic!("reload of item {} out of range", p))
                .clone();
            rebuilt[p.section].1[p.item] = value;
        }

        self.sections = rebuilt;
    }
}

impl<S: Identifiable, I: Identifiable> BatchUpdates for MockView<S, I> {
    fn delete_items(&mut self, index_paths: &[IndexPath]) {
        self.calls.push("delete_items");
        self.pending.item_deletes.extend_from_slice(index_paths);
    }

    fn delete_sections(&mut self, sections: &[usize]) {
        self.calls.push("delete_sections");
        self.pending.section_deletes.extend_from_slice(sections);
    }

    fn insert_sections(&mut self, sections: &[usize]) {
        self.calls.push("insert_sections");
        self.pending.section_inserts.extend_from_slice(sections);
    }

    fn insert_items(&mut self, index_paths: &[IndexPath]) {
        self.calls.push("insert_items");
        self.pending.item_inserts.extend_from_slice(index_paths);
    }

    fn move_section(&mut self, from: usize, to: usize) {
        self.calls.push("move_section");
        self.pending.section_moves.push((from, to));
    }

    fn move_item(&mut self, from: IndexPath, to: IndexPath) {
        self.calls.push("move_item");
        self.pending.item_moves.push((from, to));
    }

    fn reload_sections(&mut self, sections: &[usize]) {
        self.calls.push("reload_sections");
        self.pending.section_reloads.extend_from_slice(sections);
    }

    fn reload_items(&mut self, index_paths: &[IndexPath]) {
        self.calls.push("reload_items");
        self.pending.item_reloads.extend_from_slice(index_paths);
    }
}

impl<S, I> ListView for MockView<S, I>
where
    S: Identifiable,
    I: Identifiable,
{
    type Cell = String;
    type SupplementaryView = String;

    fn supports_batch_updates(&self) -> bool {
        self.supports_batch
    }

    fn perform_batch_updates(
        &mut self,
        animated: bool,
        updates: &mut dyn FnMut(&mut dyn BatchUpdates),
        completion: BatchCompletion,
    ) {
        self.batches += 1;
        if animated {
            self.animated_batches += 1;
        }
        updates(&mut *self);
        self.commit_batch();

        match self.mode {
            CompletionMode::Inline => completion(),
            CompletionMode::Deferred => self.pump.push(completion),
            CompletionMode::Threaded => {
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(2));
                    completion();
                });
            }
        }
    }

    fn reload_data(&mut self) {
        self.full_reloads += 1;
        self.calls.push("reload_data");
        self.sections = sections_of(&self.live());
    }
}

pub type TestView = MockView<&'static str, u32>;
pub type TestSource = DiffableDataSource<&'static str, u32, TestView>;

/// Cell provider rendering the item's debug form
pub fn debug_cells<S, I>() -> CellProvider<MockView<S, I>, I>
where
    S: Identifiable,
    I: Identifiable,
{
    Box::new(|_view: &MockView<S, I>, _path: IndexPath, item: &I| Some(format!("{:?}", item)))
}

/// A data source over a fresh mock view, with the view attached to it
pub fn mount_with<S, I>(
    mode: CompletionMode,
    options: DataSourceOptions<S, I>,
) -> (DiffableDataSource<S, I, MockView<S, I>>, CompletionPump)
where
    S: Identifiable + Send + Sync + 'static,
    S::Id: Send + Sync,
    I: Identifiable + Send + Sync + 'static,
    I::Id: Send + Sync,
{
    let pump = CompletionPump::default();
    let view = MockView::new(mode, pump.clone());
    let source = DiffableDataSource::with_options(view, options, debug_cells());
    let reader = source.reader();
    source.with_view(|view| view.attach(reader));
    (source, pump)
}

pub fn mount(mode: CompletionMode) -> (TestSource, CompletionPump) {
    mount_with(mode, DataSourceOptions::default())
}

/// Build a `&str`/`u32` snapshot from `(section, items)` pairs
pub fn snapshot(sections: &[(&'static str, &[u32])]) -> Snapshot<&'static str, u32> {
    Snapshot::from_sections(sections.iter().map(|(s, items)| (*s, items.to_vec()))).unwrap()
}

/// The snapshot's structure in the mock view's representation
pub fn sections_of<S: Identifiable, I: Identifiable>(snapshot: &Snapshot<S, I>) -> Vec<(S, Vec<I>)> {
    snapshot
        .sections()
        .iter()
        .map(|s| (s.id().clone(), s.items().to_vec()))
        .collect()
}
