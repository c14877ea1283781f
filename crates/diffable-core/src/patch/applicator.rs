use crate::diff::model::Changeset;
use crate::patch::view::{BatchCompletion, BatchUpdates, ListView};
use crate::snapshot::IndexPath;

/// How a changeset reached the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Empty changeset: no batch was issued
    Skipped,
    /// The view could not batch and was fully reloaded
    Reloaded,
    /// One batch of mutation calls was issued
    Batched,
}

impl PatchOutcome {
    /// How [`apply`] will deliver `changeset` to `view`
    pub fn plan<S, I, V>(changeset: &Changeset<S, I>, view: &V) -> Self
    where
        V: ListView + ?Sized,
    {
        if changeset.is_empty() {
            PatchOutcome::Skipped
        } else if !view.supports_batch_updates() {
            PatchOutcome::Reloaded
        } else {
            PatchOutcome::Batched
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOutcome::Skipped => "skipped",
            PatchOutcome::Reloaded => "reloaded",
            PatchOutcome::Batched => "batched",
        }
    }
}

/// Issue the mutation calls for `changeset`, in the fixed batch order.
///
/// Empty lists produce no call.
pub fn issue_updates<S, I>(changeset: &Changeset<S, I>, updates: &mut dyn BatchUpdates) {
    let item_deletes: Vec<IndexPath> = changeset.item_deletes.iter().map(|d| d.source).collect();
    if !item_deletes.is_empty() {
        updates.delete_items(&item_deletes);
    }

    let section_deletes: Vec<usize> = changeset
        .section_deletes
        .iter()
        .map(|d| d.source)
        .collect();
    if !section_deletes.is_empty() {
        updates.delete_sections(&section_deletes);
    }

    let section_inserts: Vec<usize> = changeset
        .section_inserts
        .iter()
        .map(|i| i.target)
        .collect();
    if !section_inserts.is_empty() {
        updates.insert_sections(&section_inserts);
    }

    let item_inserts: Vec<IndexPath> = changeset.item_inserts.iter().map(|i| i.target).collect();
    if !item_inserts.is_empty() {
        updates.insert_items(&item_inserts);
    }

    for m in &changeset.section_moves {
        updates.move_section(m.source, m.target);
    }

    for m in &changeset.item_moves {
        updates.move_item(m.source, m.target);
    }

    let item_reloads: Vec<IndexPath> = changeset.item_reloads.iter().map(|r| r.target).collect();
    if !item_reloads.is_empty() {
        updates.reload_items(&item_reloads);
    }

    let section_reloads: Vec<usize> = changeset
        .section_reloads
        .iter()
        .map(|r| r.target)
        .collect();
    if !section_reloads.is_empty() {
        updates.reload_sections(&section_reloads);
    }
}

/// Apply `changeset` to `view` in one batch.
///
/// `commit` swaps the backing structure to the new snapshot. It runs
/// exactly once: inside the batch after the mutation calls, or directly
/// when no batch is issued. `completion` fires exactly once, after
/// `commit`.
///
/// - empty changeset: commit, then completion, no batch ([`PatchOutcome::Skipped`])
/// - view without batch capability: commit, `reload_data`, completion
///   ([`PatchOutcome::Reloaded`])
/// - otherwise: one `perform_batch_updates` call ([`PatchOutcome::Batched`]);
///   completion fires on whatever context the view signals on
pub fn apply<S, I, V>(
    changeset: &Changeset<S, I>,
    view: &mut V,
    animate: bool,
    commit: impl FnOnce(),
    completion: BatchCompletion,
) -> PatchOutcome
where
    V: ListView + ?Sized,
{
    let outcome = PatchOutcome::plan(changeset, &*view);
    match outcome {
        PatchOutcome::Skipped => {
            commit();
            completion();
            tracing::debug!(patch_outcome = outcome.as_str(), "empty changeset");
        }
        PatchOutcome::Reloaded => {
            commit();
            view.reload_data();
            completion();
            tracing::debug!(
                patch_outcome = outcome.as_str(),
                "view cannot batch, reloaded"
            );
        }
        PatchOutcome::Batched => {
            let mut commit = Some(commit);
            view.perform_batch_updates(
                animate,
                &mut |updates: &mut dyn BatchUpdates| {
                    issue_updates(changeset, updates);
                    if let Some(commit) = commit.take() {
                        commit();
                    }
                },
                completion,
            );
            tracing::debug!(
                patch_outcome = outcome.as_str(),
                animate,
                changes = changeset.change_count(),
                "batch issued"
            );
        }
    }
    outcome
}
