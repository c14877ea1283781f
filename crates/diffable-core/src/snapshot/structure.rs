use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::errors::{DiffableError, Result};
use crate::identifier::Identifiable;
use crate::snapshot::IndexPath;

/// One section record: its identifier and its ordered items
#[derive(Debug, Clone, PartialEq)]
pub struct Section<S, I> {
    pub(crate) id: S,
    pub(crate) items: Vec<I>,
}

impl<S, I> Section<S, I> {
    pub fn id(&self) -> &S {
        &self.id
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }
}

/// Shared backing storage of a snapshot
///
/// `section_positions` and `item_positions` are kept consistent with
/// `sections` whenever a public mutation returns.
struct Storage<S: Identifiable, I: Identifiable> {
    sections: Vec<Section<S, I>>,
    section_positions: HashMap<S::Id, usize>,
    item_positions: HashMap<I::Id, IndexPath>,
    reloaded_sections: HashSet<S::Id>,
    reloaded_items: HashSet<I::Id>,
}

impl<S: Identifiable, I: Identifiable> Default for Storage<S, I> {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            section_positions: HashMap::new(),
            item_positions: HashMap::new(),
            reloaded_sections: HashSet::new(),
            reloaded_items: HashSet::new(),
        }
    }
}

impl<S: Identifiable, I: Identifiable> Clone for Storage<S, I> {
    fn clone(&self) -> Self {
        Self {
            sections: self.sections.clone(),
            section_positions: self.section_positions.clone(),
            item_positions: self.item_positions.clone(),
            reloaded_sections: self.reloaded_sections.clone(),
            reloaded_items: self.reloaded_items.clone(),
        }
    }
}

impl<S: Identifiable, I: Identifiable> Storage<S, I> {
    /// Re-derive section and item positions for sections `start..`
    fn reindex_from(&mut self, start: usize) {
        for (s, section) in self.sections.iter().enumerate().skip(start) {
            self.section_positions.insert(section.id.id(), s);
            for (i, item) in section.items.iter().enumerate() {
                self.item_positions.insert(item.id(), IndexPath::new(s, i));
            }
        }
    }

    /// Re-derive item positions within one section
    fn reindex_section_items(&mut self, s: usize) {
        for (i, item) in self.sections[s].items.iter().enumerate() {
            self.item_positions.insert(item.id(), IndexPath::new(s, i));
        }
    }

    fn forget_item(&mut self, id: &I::Id) {
        self.item_positions.remove(id);
        self.reloaded_items.remove(id);
    }
}

/// An ordered collection of sections, each an ordered collection of items
///
/// Mutations take identifiers (never positions) and validate completely
/// before touching anything: an `Err` leaves the snapshot exactly as it was.
/// Queries return `None` for identifiers or coordinates that are absent.
///
/// ```
/// use diffable_core::Snapshot;
///
/// let mut snapshot: Snapshot<&str, u32> = Snapshot::new();
/// snapshot.append_sections(["main"]).unwrap();
/// snapshot.append_items([1, 2, 3], None).unwrap();
/// assert_eq!(snapshot.item_identifiers(), vec![1, 2, 3]);
/// ```
pub struct Snapshot<S: Identifiable, I: Identifiable> {
    storage: Arc<Storage<S, I>>,
}

impl<S: Identifiable, I: Identifiable> Clone for Snapshot<S, I> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Identifiable, I: Identifiable> Default for Snapshot<S, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Identifiable, I: Identifiable> fmt::Debug for Snapshot<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.storage.sections.iter().map(|s| (&s.id, &s.items)))
            .finish()
    }
}

/// Structural equality: same sections holding the same items, in order.
/// Reload marks are not compared.
impl<S, I> PartialEq for Snapshot<S, I>
where
    S: Identifiable + PartialEq,
    I: Identifiable + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.storage.sections == other.storage.sections
    }
}

impl<S: Identifiable, I: Identifiable> Snapshot<S, I> {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self {
            storage: Arc::new(Storage::default()),
        }
    }

    /// Build a snapshot from `(section, items)` pairs, in order
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSection` / `DuplicateItem` if any identifier repeats.
    pub fn from_sections<It>(sections: impl IntoIterator<Item = (S, It)>) -> Result<Self>
    where
        It: IntoIterator<Item = I>,
    {
        let mut snapshot = Self::new();
        for (section, items) in sections {
            snapshot.append_sections([section.clone()])?;
            snapshot.append_items(items, Some(&section))?;
        }
        Ok(snapshot)
    }

    // ===== Mutations =====

    /// Append sections at the end, in order
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSection` if a section is already present or repeated in `sections`.
    pub fn append_sections(&mut self, sections: impl IntoIterator<Item = S>) -> Result<()> {
        let sections: Vec<S> = sections.into_iter().collect();
        self.check_new_sections(&sections)?;
        if sections.is_empty() {
            return Ok(());
        }

        let storage = Arc::make_mut(&mut self.storage);
        for section in sections {
            storage
                .section_positions
                .insert(section.id(), storage.sections.len());
            storage.sections.push(Section {
                id: section,
                items: Vec::new(),
            });
        }
        Ok(())
    }

    /// Append items at the end of `to_section`, or of the last section when `None`
    ///
    /// # Errors
    ///
    /// - `SectionNotFound` if `to_section` is absent
    /// - `NoSections` if `to_section` is `None` and the snapshot has no sections
    /// - `DuplicateItem` if an item is already present or repeated in `items`
    pub fn append_items(
        &mut self,
        items: impl IntoIterator<Item = I>,
        to_section: Option<&S>,
    ) -> Result<()> {
        let items: Vec<I> = items.into_iter().collect();
        let target = match to_section {
            Some(section) => self.section_position(section)?,
            None => self
                .storage
                .sections
                .len()
                .checked_sub(1)
                .ok_or(DiffableError::NoSections)?,
        };
        self.check_new_items(&items)?;
        if items.is_empty() {
            return Ok(());
        }

        let storage = Arc::make_mut(&mut self.storage);
        let section = &mut storage.sections[target];
        for item in items {
            storage
                .item_positions
                .insert(item.id(), IndexPath::new(target, section.items.len()));
            section.items.push(item);
        }
        Ok(())
    }

    /// Insert items immediately before `anchor`, in order
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if `anchor` is absent; `DuplicateItem` for repeated identifiers.
    pub fn insert_items_before(
        &mut self,
        items: impl IntoIterator<Item = I>,
        anchor: &I,
    ) -> Result<()> {
        self.insert_items(items, anchor, false)
    }

    /// Insert items immediately after `anchor`, in order
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if `anchor` is absent; `DuplicateItem` for repeated identifiers.
    pub fn insert_items_after(
        &mut self,
        items: impl IntoIterator<Item = I>,
        anchor: &I,
    ) -> Result<()> {
        self.insert_items(items, anchor, true)
    }

    fn insert_items(
        &mut self,
        items: impl IntoIterator<Item = I>,
        anchor: &I,
        after: bool,
    ) -> Result<()> {
        let anchor_path = self.item_path(anchor)?;
        let items: Vec<I> = items.into_iter().collect();
        self.check_new_items(&items)?;
        if items.is_empty() {
            return Ok(());
        }

        let storage = Arc::make_mut(&mut self.storage);
        let at = anchor_path.item + usize::from(after);
        storage.sections[anchor_path.section]
            .items
            .splice(at..at, items);
        storage.reindex_section_items(anchor_path.section);
        Ok(())
    }

    /// Insert empty sections immediately before `anchor`, in order
    ///
    /// # Errors
    ///
    /// `SectionNotFound` if `anchor` is absent; `DuplicateSection` for repeated identifiers.
    pub fn insert_sections_before(
        &mut self,
        sections: impl IntoIterator<Item = S>,
        anchor: &S,
    ) -> Result<()> {
        self.insert_sections(sections, anchor, false)
    }

    /// Insert empty sections immediately after `anchor`, in order
    ///
    /// # Errors
    ///
    /// `SectionNotFound` if `anchor` is absent; `DuplicateSection` for repeated identifiers.
    pub fn insert_sections_after(
        &mut self,
        sections: impl IntoIterator<Item = S>,
        anchor: &S,
    ) -> Result<()> {
        self.insert_sections(sections, anchor, true)
    }

    fn insert_sections(
        &mut self,
        sections: impl IntoIterator<Item = S>,
        anchor: &S,
        after: bool,
    ) -> Result<()> {
        let anchor_position = self.section_position(anchor)?;
        let sections: Vec<S> = sections.into_iter().collect();
        self.check_new_sections(&sections)?;
        if sections.is_empty() {
            return Ok(());
        }

        let storage = Arc::make_mut(&mut self.storage);
        let at = anchor_position + usize::from(after);
        storage.sections.splice(
            at..at,
            sections.into_iter().map(|id| Section {
                id,
                items: Vec::new(),
            }),
        );
        storage.reindex_from(at);
        Ok(())
    }

    /// Delete items wherever they are; their sections stay, even if emptied
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if any item is absent (nothing is deleted in that case).
    pub fn delete_items(&mut self, items: &[I]) -> Result<()> {
        let mut doomed = HashSet::with_capacity(items.len());
        let mut touched = BTreeSet::new();
        for item in items {
            let path = self.item_path(item)?;
            touched.insert(path.section);
            doomed.insert(item.id());
        }
        if doomed.is_empty() {
            return Ok(());
        }

        let storage = Arc::make_mut(&mut self.storage);
        for id in &doomed {
            storage.forget_item(id);
        }
        for &s in &touched {
            storage.sections[s]
                .items
                .retain(|item| !doomed.contains(&item.id()));
            storage.reindex_section_items(s);
        }
        Ok(())
    }

    /// Delete sections together with all of their items
    ///
    /// # Errors
    ///
    /// `SectionNotFound` if any section is absent (nothing is deleted in that case).
    pub fn delete_sections(&mut self, sections: &[S]) -> Result<()> {
        let mut positions = BTreeSet::new();
        for section in sections {
            positions.insert(self.section_position(section)?);
        }
        let Some(&first) = positions.first() else {
            return Ok(());
        };

        let storage = Arc::make_mut(&mut self.storage);
        for &p in positions.iter().rev() {
            let removed = storage.sections.remove(p);
            let section_id = removed.id.id();
            storage.section_positions.remove(&section_id);
            storage.reloaded_sections.remove(&section_id);
            for item in &removed.items {
                storage.forget_item(&item.id());
            }
        }
        storage.reindex_from(first);
        Ok(())
    }

    /// Delete every section and every item
    pub fn delete_all_items(&mut self) {
        self.storage = Arc::new(Storage::default());
    }

    /// Move `item` to immediately before `anchor` (possibly into another section)
    ///
    /// Moving next to itself is a no-op.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if either identifier is absent.
    pub fn move_item_before(&mut self, item: &I, anchor: &I) -> Result<()> {
        self.move_item(item, anchor, false)
    }

    /// Move `item` to immediately after `anchor` (possibly into another section)
    ///
    /// Moving next to itself is a no-op.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if either identifier is absent.
    pub fn move_item_after(&mut self, item: &I, anchor: &I) -> Result<()> {
        self.move_item(item, anchor, true)
    }

    fn move_item(&mut self, item: &I, anchor: &I, after: bool) -> Result<()> {
        let from = self.item_path(item)?;
        let anchor_path = self.item_path(anchor)?;
        if from == anchor_path || is_neighbour(from, anchor_path, after) {
            return Ok(());
        }

        let storage = Arc::make_mut(&mut self.storage);
        let moving = storage.sections[from.section].items.remove(from.item);
        let mut at = anchor_path.item;
        if from.section == anchor_path.section && from.item < anchor_path.item {
            at -= 1;
        }
        at += usize::from(after);
        storage.sections[anchor_path.section]
            .items
            .insert(at, moving);

        storage.reindex_section_items(from.section);
        if anchor_path.section != from.section {
            storage.reindex_section_items(anchor_path.section);
        }
        Ok(())
    }

    /// Move `section` (with its items) to immediately before `anchor`
    ///
    /// # Errors
    ///
    /// `SectionNotFound` if either identifier is absent.
    pub fn move_section_before(&mut self, section: &S, anchor: &S) -> Result<()> {
        self.move_section(section, anchor, false)
    }

    /// Move `section` (with its items) to immediately after `anchor`
    ///
    /// # Errors
    ///
    /// `SectionNotFound` if either identifier is absent.
    pub fn move_section_after(&mut self, section: &S, anchor: &S) -> Result<()> {
        self.move_section(section, anchor, true)
    }

    fn move_section(&mut self, section: &S, anchor: &S, after: bool) -> Result<()> {
        let from = self.section_position(section)?;
        let anchor_position = self.section_position(anchor)?;
        if from == anchor_position
            || is_neighbour(
                IndexPath::new(0, from),
                IndexPath::new(0, anchor_position),
                after,
            )
        {
            return Ok(());
        }

        let storage = Arc::make_mut(&mut self.storage);
        let moving = storage.sections.remove(from);
        let mut at = anchor_position;
        if from < anchor_position {
            at -= 1;
        }
        at += usize::from(after);
        storage.sections.insert(at, moving);
        storage.reindex_from(from.min(at));
        Ok(())
    }

    /// Mark items as content-changed for the next diff
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if any item is absent.
    pub fn reload_items(&mut self, items: &[I]) -> Result<()> {
        for item in items {
            self.item_path(item)?;
        }
        if items.is_empty() {
            return Ok(());
        }
        let storage = Arc::make_mut(&mut self.storage);
        storage.reloaded_items.extend(items.iter().map(|i| i.id()));
        Ok(())
    }

    /// Mark sections as content-changed for the next diff
    ///
    /// # Errors
    ///
    /// `SectionNotFound` if any section is absent.
    pub fn reload_sections(&mut self, sections: &[S]) -> Result<()> {
        for section in sections {
            self.section_position(section)?;
        }
        if sections.is_empty() {
            return Ok(());
        }
        let storage = Arc::make_mut(&mut self.storage);
        storage
            .reloaded_sections
            .extend(sections.iter().map(|s| s.id()));
        Ok(())
    }

    // ===== Queries =====

    pub fn number_of_sections(&self) -> usize {
        self.storage.sections.len()
    }

    /// Total number of items across all sections
    pub fn number_of_items(&self) -> usize {
        self.storage.item_positions.len()
    }

    /// Number of items in `section`, or `None` if the section is absent
    pub fn number_of_items_in_section(&self, section: &S) -> Option<usize> {
        self.index_of_section(section)
            .map(|s| self.storage.sections[s].items.len())
    }

    pub fn section_identifiers(&self) -> Vec<S> {
        self.storage.sections.iter().map(|s| s.id.clone()).collect()
    }

    /// All item identifiers, section by section
    pub fn item_identifiers(&self) -> Vec<I> {
        self.storage
            .sections
            .iter()
            .flat_map(|s| s.items.iter().cloned())
            .collect()
    }

    pub fn item_identifiers_in_section(&self, section: &S) -> Option<&[I]> {
        self.index_of_section(section)
            .map(|s| self.storage.sections[s].items.as_slice())
    }

    pub fn section_identifier_containing(&self, item: &I) -> Option<&S> {
        self.index_path(item)
            .map(|path| &self.storage.sections[path.section].id)
    }

    pub fn index_of_section(&self, section: &S) -> Option<usize> {
        self.storage.section_positions.get(&section.id()).copied()
    }

    pub fn index_path(&self, item: &I) -> Option<IndexPath> {
        self.storage.item_positions.get(&item.id()).copied()
    }

    pub fn section_at(&self, index: usize) -> Option<&S> {
        self.storage.sections.get(index).map(|s| &s.id)
    }

    pub fn item_at(&self, path: IndexPath) -> Option<&I> {
        self.storage
            .sections
            .get(path.section)
            .and_then(|s| s.items.get(path.item))
    }

    /// Ordered view of the section records
    pub fn sections(&self) -> &[Section<S, I>] {
        &self.storage.sections
    }

    /// Items marked with [`reload_items`](Self::reload_items), in snapshot order
    pub fn reloaded_item_identifiers(&self) -> Vec<I> {
        self.storage
            .sections
            .iter()
            .flat_map(|s| s.items.iter())
            .filter(|item| self.storage.reloaded_items.contains(&item.id()))
            .cloned()
            .collect()
    }

    /// Sections marked with [`reload_sections`](Self::reload_sections), in snapshot order
    pub fn reloaded_section_identifiers(&self) -> Vec<S> {
        self.storage
            .sections
            .iter()
            .filter(|s| self.storage.reloaded_sections.contains(&s.id.id()))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Whether `self` and `other` currently share backing storage
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    // ===== Crate-internal accessors for the differ and data source =====

    pub(crate) fn section_position_of(&self, id: &S::Id) -> Option<usize> {
        self.storage.section_positions.get(id).copied()
    }

    pub(crate) fn item_path_of(&self, id: &I::Id) -> Option<IndexPath> {
        self.storage.item_positions.get(id).copied()
    }

    pub(crate) fn is_section_marked(&self, id: &S::Id) -> bool {
        self.storage.reloaded_sections.contains(id)
    }

    pub(crate) fn is_item_marked(&self, id: &I::Id) -> bool {
        self.storage.reloaded_items.contains(id)
    }

    /// Drop all reload marks; they only mean something for one diff
    pub(crate) fn clear_reload_marks(&mut self) {
        if self.storage.reloaded_items.is_empty() && self.storage.reloaded_sections.is_empty() {
            return;
        }
        let storage = Arc::make_mut(&mut self.storage);
        storage.reloaded_items.clear();
        storage.reloaded_sections.clear();
    }

    // ===== Validation =====

    fn section_position(&self, section: &S) -> Result<usize> {
        self.index_of_section(section)
            .ok_or_else(|| DiffableError::section_not_found(section))
    }

    fn item_path(&self, item: &I) -> Result<IndexPath> {
        self.index_path(item)
            .ok_or_else(|| DiffableError::item_not_found(item))
    }

    fn check_new_sections(&self, sections: &[S]) -> Result<()> {
        let mut seen = HashSet::with_capacity(sections.len());
        for section in sections {
            let id = section.id();
            if self.storage.section_positions.contains_key(&id) || !seen.insert(id) {
                return Err(DiffableError::duplicate_section(section));
            }
        }
        Ok(())
    }

    fn check_new_items(&self, items: &[I]) -> Result<()> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            let id = item.id();
            if self.storage.item_positions.contains_key(&id) || !seen.insert(id) {
                return Err(DiffableError::duplicate_item(item));
            }
        }
        Ok(())
    }
}

/// Whether moving `from` next to `anchor` would leave it where it already is
fn is_neighbour(from: IndexPath, anchor: IndexPath, after: bool) -> bool {
    if from.section != anchor.section {
        return false;
    }
    if after {
        anchor.item + 1 == from.item
    } else {
        from.item + 1 == anchor.item
    }
}
