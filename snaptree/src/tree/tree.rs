//! Persistent B-tree handle.
//!
//! A `Tree` is an immutable value: an optional root node, the configuration
//! it was built with, and its key ordering. Every change returns a new
//! `Tree` that rebuilds only the nodes on the path from the root to the
//! changed leaf and shares every other subtree with the old one.
//!
//! Earlier versions stay valid and unchanged for as long as anyone holds
//! them, so readers never need to coordinate with writers.

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::tree::cursor::{Cursor, child_at};
use crate::tree::node::{Leaf, Node, NodeRef, Slot};
use crate::tree::order::{KeyOrder, Natural};

/// An immutable ordered map.
#[derive(Debug)]
pub struct Tree<K, V, O = Natural> {
    root: Option<NodeRef<K, V>>,
    config: TreeConfig,
    order: O,
}

impl<K, V, O: Clone> Clone for Tree<K, V, O> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            config: self.config,
            order: self.order.clone(),
        }
    }
}

impl<K, V, O: Default> Default for Tree<K, V, O> {
    fn default() -> Self {
        Self {
            root: None,
            config: TreeConfig::default(),
            order: O::default(),
        }
    }
}

impl<K, V> Tree<K, V, Natural> {
    /// Create an empty tree with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree with the given configuration.
    #[must_use]
    pub const fn with_config(config: TreeConfig) -> Self {
        Self::with_order(Natural, config)
    }
}

impl<K, V, O> Tree<K, V, O> {
    /// Create an empty tree with a custom key ordering.
    #[must_use]
    pub const fn with_order(order: O, config: TreeConfig) -> Self {
        Self {
            root: None,
            config,
            order,
        }
    }

    pub(crate) const fn root(&self) -> Option<&NodeRef<K, V>> {
        self.root.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[must_use]
    pub const fn order(&self) -> &O {
        &self.order
    }

    /// Number of associations. O(1).
    #[must_use]
    pub fn count(&self) -> u64 {
        self.root.as_ref().map_or(0, |root| root.total())
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of node levels; 0 for the empty tree.
    #[must_use]
    pub fn height(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.height())
    }

    /// Check whether two handles share the same root node.
    #[must_use]
    pub fn same_root(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// The cursor at the least key.
    #[must_use]
    pub fn first(&self) -> Option<Cursor<K, V>> {
        Cursor::next_from(None, Some(self))
    }

    /// The cursor at the greatest key.
    #[must_use]
    pub fn last(&self) -> Option<Cursor<K, V>> {
        Cursor::previous_from(None, Some(self))
    }

    /// Iterate over the associations in key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            stack: self
                .root
                .as_deref()
                .map_or_else(Vec::new, |root| vec![(root, 0)]),
            remaining: usize::try_from(self.count()).unwrap_or(usize::MAX),
        }
    }

    fn with_root(&self, root: Option<NodeRef<K, V>>) -> Self
    where
        O: Clone,
    {
        Self {
            root,
            config: self.config,
            order: self.order.clone(),
        }
    }
}

impl<K, V, O: KeyOrder<K>> Tree<K, V, O> {
    /// Get the value associated with `key`.
    #[must_use]
    pub fn lookup(&self, key: &K) -> Option<&V> {
        self.root.as_ref()?.lookup(&self.order, key)
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.lookup(key).is_some()
    }

    /// The cursor at the least key `>= key`, or `None` if `key` is above
    /// every key in the tree.
    #[must_use]
    pub fn position_at(&self, key: &K) -> Option<Cursor<K, V>> {
        Cursor::seek(self.root.as_ref()?, &self.order, key)
    }

    /// Check the structural invariants of the whole tree.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Corrupt` naming the first invariant that fails.
    pub fn validate(&self) -> Result<(), TreeError> {
        let Some(root) = &self.root else {
            return Ok(());
        };
        if !root.is_leaf() && root.slot_count() == 0 {
            return Err(TreeError::Corrupt("inner root without slots"));
        }
        root.validate(&self.order, &self.config, true, None, None)?;
        Ok(())
    }
}

impl<K: Clone, V: Clone, O: KeyOrder<K> + Clone> Tree<K, V, O> {
    /// Associate `key` with `value`, which must not already be present.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::DuplicateKey` if `key` is present.
    pub fn insert(&self, key: K, value: V) -> Result<Self, TreeError> {
        if self.contains(&key) {
            return Err(TreeError::DuplicateKey);
        }
        Ok(self.insert_absent(key, value))
    }

    /// Associate `key` with `value`, replacing any value already there.
    #[must_use]
    pub fn add(&self, key: K, value: V) -> Self {
        let Some(root) = &self.root else {
            return self.insert_absent(key, value);
        };
        match root.update(&self.order, &key, value) {
            Ok(root) => self.with_root(Some(Arc::new(root))),
            Err(value) => self.insert_absent(key, value),
        }
    }

    /// Like `add`, for callers whose value may be absent.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::NullAssociation` if `value` is `None`; `self` is
    /// left as it was.
    pub fn add_nn(&self, key: K, value: Option<V>) -> Result<Self, TreeError> {
        value
            .map(|value| self.add(key, value))
            .ok_or(TreeError::NullAssociation)
    }

    /// Replace the value of a key that is already present.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::MissingKey` if `key` is not present.
    pub fn update(&self, key: &K, value: V) -> Result<Self, TreeError> {
        let root = self.root.as_ref().ok_or(TreeError::MissingKey)?;
        let root = root
            .update(&self.order, key, value)
            .map_err(|_| TreeError::MissingKey)?;
        Ok(self.with_root(Some(Arc::new(root))))
    }

    /// Remove the association for `key`.
    ///
    /// Removing a key that is not present returns a tree sharing this
    /// tree's root.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Corrupt` if rebalancing meets a malformed node.
    pub fn remove(&self, key: &K) -> Result<Self, TreeError> {
        let Some(root) = &self.root else {
            return Ok(self.clone());
        };
        let mut root = match root.remove(&self.order, key, &self.config) {
            Ok(Some(root)) => Arc::new(root),
            Ok(None) => return Ok(self.with_root(None)),
            Err(TreeError::MissingKey) => return Ok(self.clone()),
            Err(e) => return Err(e),
        };
        // An inner root left with only its greater child gives up a level.
        loop {
            let Some(gtr) = root.gtr().filter(|_| root.slot_count() == 0).cloned() else {
                break;
            };
            tracing::debug!(height = gtr.height(), "collapsing empty root");
            root = gtr;
        }
        Ok(self.with_root(Some(root)))
    }

    /// Remove `key` only if it is associated with `value`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Corrupt` if rebalancing meets a malformed node.
    pub fn remove_entry(&self, key: &K, value: &V) -> Result<Self, TreeError>
    where
        V: PartialEq,
    {
        if self.lookup(key) == Some(value) {
            self.remove(key)
        } else {
            Ok(self.clone())
        }
    }

    /// `add` every association of `other`, in `other`'s order.
    ///
    /// The result keeps this tree's ordering and configuration.
    #[must_use]
    pub fn merge<P>(&self, other: &Tree<K, V, P>) -> Self {
        other
            .iter()
            .fold(self.clone(), |tree, (k, v)| tree.add(k.clone(), v.clone()))
    }

    /// Insert a key known to be absent.
    fn insert_absent(&self, key: K, value: V) -> Self {
        let fanout = self.config.fanout();
        let root = match &self.root {
            None => Node::Leaf(Leaf::new(vec![(key, value)])),
            Some(root) if root.is_full(fanout) => {
                let split = root.split();
                tracing::debug!(height = split.height(), "splitting full root");
                split.add(&self.order, key, value, fanout)
            }
            Some(root) => root.add(&self.order, key, value, fanout),
        };
        self.with_root(Some(Arc::new(root)))
    }
}

impl<K: Ord + Clone, V: Clone> FromIterator<(K, V)> for Tree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Clone, V: Clone, O: KeyOrder<K> + Clone> Extend<(K, V)> for Tree<K, V, O> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            *self = self.add(key, value);
        }
    }
}

impl<'a, K, V, O> IntoIterator for &'a Tree<K, V, O> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing in-order iterator over a tree.
///
/// Keeps a stack of `(node, next position)` pairs, the same walk a cursor
/// makes, without allocating a frame per step.
#[derive(Debug)]
pub struct Iter<'a, K, V> {
    stack: Vec<(&'a Node<K, V>, usize)>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, pos) = self.stack.pop()?;
            if node.is_leaf() {
                if pos >= node.slot_count() {
                    continue;
                }
                self.stack.push((node, pos + 1));
                if let (key, Slot::Value(value)) = node.slot(pos) {
                    self.remaining = self.remaining.saturating_sub(1);
                    return Some((key, value));
                }
                continue;
            }
            // Inner positions run up to and including the greater child.
            if pos > node.slot_count() {
                continue;
            }
            self.stack.push((node, pos + 1));
            if let Some(child) = child_at(node, pos) {
                self.stack.push((&**child, 0));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
