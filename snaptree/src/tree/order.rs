//! Key ordering used by a tree.
//!
//! The ordering is fixed per tree type: every node search goes through the
//! tree's `KeyOrder`, so two trees with different orderings never mix.

use std::cmp::Ordering;

/// A total order over keys of type `K`.
pub trait KeyOrder<K: ?Sized> {
    /// Compare two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// The key type's own `Ord` implementation.
///
/// `Option<K>` keys sort `None` first, which is how absent key components
/// are ordered in the engine's indexes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<K: Ord + ?Sized> KeyOrder<K> for Natural {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Descending order over the key type's `Ord`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Descending;

impl<K: Ord + ?Sized> KeyOrder<K> for Descending {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        b.cmp(a)
    }
}
