//! Reload policy
//!
//! Decides what an explicit reload mark on a snapshot
//! ([`Snapshot::reload_items`](crate::Snapshot::reload_items),
//! [`Snapshot::reload_sections`](crate::Snapshot::reload_sections)) means
//! to the differ. Identifiers whose content differs between the two
//! snapshots are reloaded under every policy.

/// Interpretation of explicit reload marks
///
/// # Example
/// ```
/// use diffable_core::{diff::Differ, policy::ReloadPolicy, Snapshot};
///
/// let old: Snapshot<&str, u32> = Snapshot::from_sections([("a", vec![1])]).unwrap();
/// let mut new = old.clone();
/// new.reload_items(&[1]).unwrap();
///
/// // Content of `1` is unchanged: the mark is short-circuited by default.
/// assert!(Differ::new().diff(&old, &new).item_reloads.is_empty());
///
/// let forced = Differ::new().with_reload_policy(ReloadPolicy::Forced);
/// assert_eq!(forced.diff(&old, &new).item_reloads.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPolicy {
    /// A mark produces a reload only if the content actually changed
    #[default]
    ContentChanged,
    /// Every mark produces a reload
    Forced,
}

impl ReloadPolicy {
    /// Stable name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadPolicy::ContentChanged => "content_changed",
            ReloadPolicy::Forced => "forced",
        }
    }
}
