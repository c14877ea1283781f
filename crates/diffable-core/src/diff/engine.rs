//! Changeset computation engine.
//!
//! The core entry point is [`Differ::diff`] (or the free function [`diff`]),
//! which compares two frozen snapshots and produces a [`Changeset`].
//!
//! Sections are matched first, then items. On each level, identifiers only
//! on the old side are deletions, identifiers only on the new side are
//! insertions, and identifiers on both sides are matched. Matched
//! identifiers whose old positions, read in new order, belong to the
//! longest increasing subsequence stay put; every other matched identifier
//! is reported as a move. This keeps the move list minimal for any
//! reordering, including cyclic ones.

use crate::diff::model::{Changeset, Deletion, Insertion, Move, Reload};
use crate::identifier::Identifiable;
use crate::policy::ReloadPolicy;
use crate::snapshot::{IndexPath, Snapshot};

/// A changeset producer
///
/// The data source holds one behind an `Arc`, chosen at construction
/// time. [`Differ`] is the built-in engine; hosts that ship an equivalent
/// native engine can wrap it behind this trait.
pub trait DiffEngine<S: Identifiable, I: Identifiable>: Send + Sync {
    /// Compute the changeset taking `old` to `new`. Must be pure.
    fn diff(&self, old: &Snapshot<S, I>, new: &Snapshot<S, I>) -> Changeset<S, I>;

    /// Short name used in log events
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// The built-in LIS-based differ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Differ {
    reload_policy: ReloadPolicy,
}

impl Differ {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reload_policy(mut self, reload_policy: ReloadPolicy) -> Self {
        self.reload_policy = reload_policy;
        self
    }

    pub fn reload_policy(&self) -> ReloadPolicy {
        self.reload_policy
    }

    /// Compute the changeset taking `old` to `new`.
    ///
    /// Pure and deterministic: the same pair of snapshots always yields the
    /// same changeset, list by list and entry by entry.
    pub fn diff<S: Identifiable, I: Identifiable>(
        &self,
        old: &Snapshot<S, I>,
        new: &Snapshot<S, I>,
    ) -> Changeset<S, I> {
        let mut changeset = Changeset::default();
        if old.shares_storage_with(new) && !self.honours_marks(new) {
            return changeset;
        }

        let sections = self.diff_sections(old, new, &mut changeset);
        self.diff_items(old, new, &sections, &mut changeset);

        tracing::debug!(
            section_deletes = changeset.section_deletes.len(),
            section_inserts = changeset.section_inserts.len(),
            section_moves = changeset.section_moves.len(),
            section_reloads = changeset.section_reloads.len(),
            item_deletes = changeset.item_deletes.len(),
            item_inserts = changeset.item_inserts.len(),
            item_moves = changeset.item_moves.len(),
            item_reloads = changeset.item_reloads.len(),
            "computed changeset"
        );
        changeset
    }

    /// Section pass. Fills section deletes/inserts/moves/reloads and returns
    /// the old → new section correspondence for the item pass.
    fn diff_sections<S: Identifiable, I: Identifiable>(
        &self,
        old: &Snapshot<S, I>,
        new: &Snapshot<S, I>,
        changeset: &mut Changeset<S, I>,
    ) -> SectionMatch {
        let old_sections = old.sections();
        let new_sections = new.sections();

        let mut matches = SectionMatch {
            old_to_new: vec![None; old_sections.len()],
            new_is_inserted: vec![false; new_sections.len()],
        };
        let mut matched = Vec::new();

        for (target, section) in new_sections.iter().enumerate() {
            match old.section_position_of(&section.id().id()) {
                Some(source) => {
                    matches.old_to_new[source] = Some(target);
                    matched.push((source, target));
                }
                None => {
                    matches.new_is_inserted[target] = true;
                    changeset.section_inserts.push(Insertion {
                        id: section.id().clone(),
                        target,
                    });
                }
            }
        }

        for (source, section) in old_sections.iter().enumerate() {
            if matches.old_to_new[source].is_none() {
                changeset.section_deletes.push(Deletion {
                    id: section.id().clone(),
                    source,
                });
            }
        }

        let sources: Vec<usize> = matched.iter().map(|&(source, _)| source).collect();
        let stable = increasing_subsequence_mask(&sources);
        for (k, &(source, target)) in matched.iter().enumerate() {
            let before = old_sections[source].id();
            let after = new_sections[target].id();
            if !stable[k] {
                changeset.section_moves.push(Move {
                    id: after.clone(),
                    source,
                    target,
                });
            }
            if self.needs_reload(before, after, new.is_section_marked(&after.id())) {
                changeset.section_reloads.push(Reload {
                    id: after.clone(),
                    source,
                    target,
                });
            }
        }

        matches
    }

    /// Item pass, run after the section pass.
    fn diff_items<S: Identifiable, I: Identifiable>(
        &self,
        old: &Snapshot<S, I>,
        new: &Snapshot<S, I>,
        sections: &SectionMatch,
        changeset: &mut Changeset<S, I>,
    ) {
        for (s, section) in old.sections().iter().enumerate() {
            // Items of a deleted section go with the section.
            if sections.old_to_new[s].is_none() {
                continue;
            }
            for (i, item) in section.items().iter().enumerate() {
                if new.item_path_of(&item.id()).is_none() {
                    changeset.item_deletes.push(Deletion {
                        id: item.clone(),
                        source: IndexPath::new(s, i),
                    });
                }
            }
        }

        for (t, section) in new.sections().iter().enumerate() {
            let placements: Vec<Placement> = section
                .items()
                .iter()
                .map(|item| match old.item_path_of(&item.id()) {
                    None => Placement::Inserted,
                    Some(source) if sections.old_to_new[source.section] == Some(t) => {
                        Placement::SameSection(source)
                    }
                    Some(source) => Placement::CrossSection(source),
                })
                .collect();

            let same_section: Vec<usize> = placements
                .iter()
                .filter_map(|p| match p {
                    Placement::SameSection(source) => Some(source.item),
                    _ => None,
                })
                .collect();
            let mut stable = increasing_subsequence_mask(&same_section).into_iter();

            for (j, (item, placement)) in section.items().iter().zip(&placements).enumerate() {
                let target = IndexPath::new(t, j);
                let source = match *placement {
                    Placement::Inserted => {
                        // Items of an inserted section go with the section.
                        if !sections.new_is_inserted[t] {
                            changeset.item_inserts.push(Insertion {
                                id: item.clone(),
                                target,
                            });
                        }
                        continue;
                    }
                    Placement::SameSection(source) => {
                        if !stable.next().unwrap_or(false) {
                            changeset.item_moves.push(Move {
                                id: item.clone(),
                                source,
                                target,
                            });
                        }
                        source
                    }
                    Placement::CrossSection(source) => {
                        changeset.item_moves.push(Move {
                            id: item.clone(),
                            source,
                            target,
                        });
                        source
                    }
                };

                if let Some(before) = old.item_at(source) {
                    if self.needs_reload(before, item, new.is_item_marked(&item.id())) {
                        changeset.item_reloads.push(Reload {
                            id: item.clone(),
                            source,
                            target,
                        });
                    }
                }
            }
        }
    }

    fn needs_reload<T: Identifiable>(&self, before: &T, after: &T, marked: bool) -> bool {
        if !before.is_content_equal(after) {
            return true;
        }
        marked && self.reload_policy == ReloadPolicy::Forced
    }

    fn honours_marks<S: Identifiable, I: Identifiable>(&self, snapshot: &Snapshot<S, I>) -> bool {
        self.reload_policy == ReloadPolicy::Forced
            && !(snapshot.reloaded_item_identifiers().is_empty()
                && snapshot.reloaded_section_identifiers().is_empty())
    }
}

impl<S: Identifiable, I: Identifiable> DiffEngine<S, I> for Differ {
    fn diff(&self, old: &Snapshot<S, I>, new: &Snapshot<S, I>) -> Changeset<S, I> {
        Differ::diff(self, old, new)
    }

    fn name(&self) -> &'static str {
        "lis"
    }
}

/// Compute the changeset taking `old` to `new` with the default [`Differ`].
pub fn diff<S: Identifiable, I: Identifiable>(
    old: &Snapshot<S, I>,
    new: &Snapshot<S, I>,
) -> Changeset<S, I> {
    Differ::default().diff(old, new)
}

struct SectionMatch {
    old_to_new: Vec<Option<usize>>,
    new_is_inserted: Vec<bool>,
}

#[derive(Debug, Clone, Copy)]
enum Placement {
    Inserted,
    SameSection(IndexPath),
    CrossSection(IndexPath),
}

/// Mark the members of one longest strictly increasing subsequence of `seq`.
///
/// Patience sorting with predecessor links. Among subsequences of maximal
/// length, the one ending at the last-placed tail is kept, which makes the
/// choice depend only on `seq`.
fn increasing_subsequence_mask(seq: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessor: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, &value) in seq.iter().enumerate() {
        let pos = tails.partition_point(|&t| seq[t] < value);
        if pos > 0 {
            predecessor[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut mask = vec![false; seq.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        mask[i] = true;
        cursor = predecessor[i];
    }
    mask
}
