//! Identity and content equality for section and item identifiers
//!
//! Identity decides whether two values denote the same logical row or
//! section across snapshots. Content equality decides whether a row that
//! kept its identity must be reloaded. The two are separate capabilities
//! of one trait, [`Identifiable`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// An identifier usable as a section or item in a [`Snapshot`](crate::Snapshot)
///
/// Implementations for primitive types use the value itself as identity,
/// so their content never differs. Use [`Keyed`] to attach content that
/// participates in reload detection.
pub trait Identifiable: Clone + fmt::Debug {
    /// Stable identity key
    type Id: Hash + Eq + Clone + fmt::Debug;

    /// The identity key of this value
    fn id(&self) -> Self::Id;

    /// Whether `self` and `other` (already known to share an identity) have the same content
    fn is_content_equal(&self, other: &Self) -> bool;
}

macro_rules! identity_is_content {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identifiable for $ty {
                type Id = $ty;

                fn id(&self) -> Self::Id {
                    self.clone()
                }

                fn is_content_equal(&self, _other: &Self) -> bool {
                    true
                }
            }
        )*
    };
}

identity_is_content!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, char, bool, String,
    &'static str,
);

/// An identifier whose identity is `key` and whose content is `content`
///
/// ```
/// use diffable_core::{Identifiable, Keyed};
///
/// let before = Keyed::new(7, "draft");
/// let after = Keyed::new(7, "final");
/// assert_eq!(before.id(), after.id());
/// assert!(!before.is_content_equal(&after));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyed<K, C> {
    pub key: K,
    pub content: C,
}

impl<K, C> Keyed<K, C> {
    pub fn new(key: K, content: C) -> Self {
        Self { key, content }
    }
}

impl<K, C> Identifiable for Keyed<K, C>
where
    K: Hash + Eq + Clone + fmt::Debug,
    C: PartialEq + Clone + fmt::Debug,
{
    type Id = K;

    fn id(&self) -> Self::Id {
        self.key.clone()
    }

    fn is_content_equal(&self, other: &Self) -> bool {
        self.content == other.content
    }
}
