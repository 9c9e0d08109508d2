//! One key, many values.
//!
//! Non-unique secondary indexes associate a key with several values. A
//! `MultiTree` keeps, for each key, a tree of its values (ordered by the
//! value type's own `Ord`), and counts pairs rather than keys.
//!
//! # Invariants
//!
//! - No key maps to an empty set of values
//! - `count()` is the number of `(key, value)` pairs

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::tree::order::{KeyOrder, Natural};
use crate::tree::tree::{Iter, Tree};

/// An immutable ordered multimap.
#[derive(Debug)]
pub struct MultiTree<K, V, O = Natural> {
    tree: Tree<K, Tree<V, ()>, O>,
    count: u64,
}

impl<K, V, O: Clone> Clone for MultiTree<K, V, O> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            count: self.count,
        }
    }
}

impl<K, V, O: Default> Default for MultiTree<K, V, O> {
    fn default() -> Self {
        Self {
            tree: Tree::default(),
            count: 0,
        }
    }
}

impl<K, V> MultiTree<K, V, Natural> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty multimap; the configuration applies to the key tree
    /// and to every value set.
    #[must_use]
    pub const fn with_config(config: TreeConfig) -> Self {
        Self::with_order(Natural, config)
    }
}

impl<K, V, O> MultiTree<K, V, O> {
    #[must_use]
    pub const fn with_order(order: O, config: TreeConfig) -> Self {
        Self {
            tree: Tree::with_order(order, config),
            count: 0,
        }
    }

    /// Number of `(key, value)` pairs. O(1).
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn key_count(&self) -> u64 {
        self.tree.count()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Iterate over every `(key, value)` pair, by key and then by value.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.tree
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |(value, ())| (key, value)))
    }

    /// Iterate over each key with its set of values.
    pub(crate) fn groups(&self) -> Iter<'_, K, Tree<V, ()>> {
        self.tree.iter()
    }
}

impl<K, V, O: KeyOrder<K>> MultiTree<K, V, O> {
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.tree.contains(key)
    }

    /// The values associated with `key`.
    #[must_use]
    pub fn lookup(&self, key: &K) -> Option<&Tree<V, ()>> {
        self.tree.lookup(key)
    }
}

impl<K, V: Ord, O: KeyOrder<K>> MultiTree<K, V, O> {
    /// Check whether `key` is associated with `value`.
    #[must_use]
    pub fn contains_entry(&self, key: &K, value: &V) -> bool {
        self.lookup(key).is_some_and(|values| values.contains(value))
    }
}

impl<K: Clone, V: Ord + Clone, O: KeyOrder<K> + Clone> MultiTree<K, V, O> {
    /// Associate `value` with `key`, keeping any values already there.
    ///
    /// Adding a pair that is already present returns an equal multimap.
    #[must_use]
    pub fn add(&self, key: K, value: V) -> Self {
        let values = match self.lookup(&key) {
            Some(values) if values.contains(&value) => return self.clone(),
            Some(values) => values.add(value, ()),
            None => Tree::with_config(*self.tree.config()).add(value, ()),
        };
        Self {
            tree: self.tree.add(key, values),
            count: self.count + 1,
        }
    }

    /// Remove `key` with all of its values.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Corrupt` if rebalancing meets a malformed node.
    pub fn remove(&self, key: &K) -> Result<Self, TreeError> {
        let Some(values) = self.lookup(key) else {
            return Ok(self.clone());
        };
        let count = self.count - values.count();
        Ok(Self {
            tree: self.tree.remove(key)?,
            count,
        })
    }

    /// Remove one `(key, value)` pair; a key left with no values is removed.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Corrupt` if rebalancing meets a malformed node.
    pub fn remove_entry(&self, key: &K, value: &V) -> Result<Self, TreeError> {
        let Some(values) = self.lookup(key).filter(|values| values.contains(value)) else {
            return Ok(self.clone());
        };
        let values = values.remove(value)?;
        let tree = if values.is_empty() {
            self.tree.remove(key)?
        } else {
            self.tree.add(key.clone(), values)
        };
        Ok(Self {
            tree,
            count: self.count - 1,
        })
    }
}
