//! Tree node types.
//!
//! The tree is built from two node kinds:
//! - Leaf nodes: store key-value pairs
//! - Inner nodes: store keys and child subtrees, plus one "greater" child
//!   holding the keys above every slot key
//!
//! Nodes are immutable. Every operation that changes a node returns a new
//! one; unchanged children are shared through `Arc`.
//!
//! Inner slot `j` holds a child whose keys are all `<= key[j]` and
//! `> key[j - 1]`. A separator may be larger than the real maximum of its
//! child once that maximum has been removed; it is still a valid bound.

use std::sync::Arc;

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::tree::order::KeyOrder;

/// Shared reference to an immutable node.
pub type NodeRef<K, V> = Arc<Node<K, V>>;

/// A tree node.
#[derive(Debug)]
pub enum Node<K, V> {
    Leaf(Leaf<K, V>),
    Inner(Inner<K, V>),
}

/// A leaf node: key-value pairs in key order.
#[derive(Debug)]
pub struct Leaf<K, V> {
    slots: Vec<(K, V)>,
}

/// An inner node.
///
/// Stores N keys with N children, plus the greater child.
/// `total` counts every value stored below this node.
#[derive(Debug)]
pub struct Inner<K, V> {
    slots: Vec<(K, NodeRef<K, V>)>,
    gtr: NodeRef<K, V>,
    total: u64,
}

/// The payload of a slot.
///
/// Inner slots always hold children and leaf slots always hold values, so a
/// traversal can walk both levels with one loop and match on this.
#[derive(Debug)]
pub enum Slot<'a, K, V> {
    /// A child subtree (inner nodes).
    Child(&'a NodeRef<K, V>),
    /// A stored value (leaf nodes).
    Value(&'a V),
}

/// Result of merging two adjacent siblings.
enum Merged<K, V> {
    /// Everything fits in one node.
    One(Node<K, V>),
    /// Too many slots for one node: redistributed over two, with a new
    /// separator between them.
    Two(Node<K, V>, K, Node<K, V>),
}

impl<K, V> Leaf<K, V> {
    /// Create a leaf from slots already in key order.
    #[must_use]
    pub const fn new(slots: Vec<(K, V)>) -> Self {
        Self { slots }
    }

    fn find<O: KeyOrder<K>>(&self, order: &O, key: &K) -> Result<usize, usize> {
        self.slots.binary_search_by(|(k, _)| order.compare(k, key))
    }
}

impl<K, V> Inner<K, V> {
    /// Create an inner node from its slots and greater child.
    ///
    /// The total is computed from the children.
    #[must_use]
    pub fn new(slots: Vec<(K, NodeRef<K, V>)>, gtr: NodeRef<K, V>) -> Self {
        let total = slots.iter().map(|(_, child)| child.total()).sum::<u64>() + gtr.total();
        Self { slots, gtr, total }
    }

    fn find<O: KeyOrder<K>>(&self, order: &O, key: &K) -> Result<usize, usize> {
        self.slots.binary_search_by(|(k, _)| order.compare(k, key))
    }

    /// Child at position `i`; position `slots.len()` is the greater child.
    fn child(&self, i: usize) -> &NodeRef<K, V> {
        self.slots.get(i).map_or(&self.gtr, |(_, child)| child)
    }

    /// The child whose key range covers `key`.
    fn child_for<O: KeyOrder<K>>(&self, order: &O, key: &K) -> &NodeRef<K, V> {
        let (j, _) = position(self.find(order, key));
        self.child(j)
    }
}

impl<K: Clone, V> Inner<K, V> {
    /// Split into separators and children (`children.len() == seps.len() + 1`).
    fn parts(&self) -> (Vec<K>, Vec<NodeRef<K, V>>) {
        let mut seps = Vec::with_capacity(self.slots.len());
        let mut children = Vec::with_capacity(self.slots.len() + 1);
        for (key, child) in &self.slots {
            seps.push(key.clone());
            children.push(Arc::clone(child));
        }
        children.push(Arc::clone(&self.gtr));
        (seps, children)
    }

    /// Inverse of `parts`.
    fn from_parts(seps: Vec<K>, mut children: Vec<NodeRef<K, V>>) -> Result<Self, TreeError> {
        let gtr = children
            .pop()
            .ok_or(TreeError::Corrupt("inner node without children"))?;
        if children.len() != seps.len() {
            return Err(TreeError::Corrupt("separator and child counts disagree"));
        }
        Ok(Self::new(seps.into_iter().zip(children).collect(), gtr))
    }
}

const fn position(found: Result<usize, usize>) -> (usize, bool) {
    match found {
        Ok(i) => (i, true),
        Err(i) => (i, false),
    }
}

impl<K, V> Node<K, V> {
    /// Number of slots in use (the greater child is not a slot).
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        match self {
            Self::Leaf(leaf) => leaf.slots.len(),
            Self::Inner(inner) => inner.slots.len(),
        }
    }

    /// Number of values in this node and all its children.
    #[must_use]
    pub const fn total(&self) -> u64 {
        match self {
            Self::Leaf(leaf) => leaf.slots.len() as u64,
            Self::Inner(inner) => inner.total,
        }
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Check if the node has no room for another slot.
    #[must_use]
    pub const fn is_full(&self, fanout: usize) -> bool {
        self.slot_count() >= fanout
    }

    /// Last valid traversal position.
    ///
    /// For an inner node this is the greater child's position.
    #[must_use]
    pub const fn end_pos(&self) -> usize {
        match self {
            Self::Leaf(leaf) => leaf.slots.len().saturating_sub(1),
            Self::Inner(inner) => inner.slots.len(),
        }
    }

    /// The greater child, or `None` for a leaf.
    #[must_use]
    pub const fn gtr(&self) -> Option<&NodeRef<K, V>> {
        match self {
            Self::Leaf(_) => None,
            Self::Inner(inner) => Some(&inner.gtr),
        }
    }

    /// The key and payload at slot `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= slot_count()`.
    #[must_use]
    pub fn slot(&self, i: usize) -> (&K, Slot<'_, K, V>) {
        match self {
            Self::Leaf(leaf) => {
                let (key, value) = &leaf.slots[i];
                (key, Slot::Value(value))
            }
            Self::Inner(inner) => {
                let (key, child) = &inner.slots[i];
                (key, Slot::Child(child))
            }
        }
    }

    /// Number of values covered by the slots strictly before position `i`.
    #[must_use]
    pub fn total_before(&self, i: usize) -> u64 {
        match self {
            Self::Leaf(leaf) => i.min(leaf.slots.len()) as u64,
            Self::Inner(inner) => inner
                .slots
                .iter()
                .take(i)
                .map(|(_, child)| child.total())
                .sum(),
        }
    }

    /// Find the position in this node at which `key` belongs.
    ///
    /// The position is `slot_count()` if `key` is greater than every slot
    /// key. The flag reports an exact match.
    #[must_use]
    pub fn position_for<O: KeyOrder<K>>(&self, order: &O, key: &K) -> (usize, bool) {
        match self {
            Self::Leaf(leaf) => position(leaf.find(order, key)),
            Self::Inner(inner) => position(inner.find(order, key)),
        }
    }

    /// Check if the subtree contains `key`.
    #[must_use]
    pub fn contains<O: KeyOrder<K>>(&self, order: &O, key: &K) -> bool {
        self.lookup(order, key).is_some()
    }

    /// Get the value stored under `key` in this subtree.
    #[must_use]
    pub fn lookup<O: KeyOrder<K>>(&self, order: &O, key: &K) -> Option<&V> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => {
                    return leaf.find(order, key).ok().map(|i| &leaf.slots[i].1);
                }
                Self::Inner(inner) => node = inner.child_for(order, key),
            }
        }
    }

    /// Depth of the subtree; a leaf has height 1.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = self;
        while let Self::Inner(inner) = node {
            height += 1;
            node = &inner.gtr;
        }
        height
    }

    /// Check the structural invariants of this subtree.
    ///
    /// Keys must lie in `(lower, upper]`. Returns the subtree height.
    pub(crate) fn validate<O: KeyOrder<K>>(
        &self,
        order: &O,
        config: &TreeConfig,
        is_root: bool,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> Result<usize, TreeError> {
        use std::cmp::Ordering;

        let count = self.slot_count();
        if count > config.fanout() {
            return Err(TreeError::Corrupt("node over fanout"));
        }
        if !is_root && count < config.min_slots() {
            return Err(TreeError::Corrupt("non-root node under minimum occupancy"));
        }
        if self.is_leaf() && count == 0 {
            return Err(TreeError::Corrupt("empty leaf"));
        }

        let mut prev = lower;
        for i in 0..count {
            let (key, _) = self.slot(i);
            if prev.is_some_and(|p| order.compare(p, key) != Ordering::Less) {
                return Err(TreeError::Corrupt("keys out of order"));
            }
            if upper.is_some_and(|u| order.compare(key, u) == Ordering::Greater) {
                return Err(TreeError::Corrupt("key above parent bound"));
            }
            prev = Some(key);
        }

        match self {
            Self::Leaf(_) => Ok(1),
            Self::Inner(inner) => {
                let mut height = None;
                let mut low = lower;
                for (key, child) in &inner.slots {
                    let h = child.validate(order, config, false, low, Some(key))?;
                    if height.is_some_and(|prev| prev != h) {
                        return Err(TreeError::Corrupt("leaves at different depths"));
                    }
                    height = Some(h);
                    low = Some(key);
                }
                let h = inner.gtr.validate(order, config, false, low, upper)?;
                if height.is_some_and(|prev| prev != h) {
                    return Err(TreeError::Corrupt("leaves at different depths"));
                }
                let sum = inner.slots.iter().map(|(_, c)| c.total()).sum::<u64>() + inner.gtr.total();
                if sum != inner.total {
                    return Err(TreeError::Corrupt("total disagrees with children"));
                }
                Ok(h + 1)
            }
        }
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Create a new node with `key` inserted in order.
    ///
    /// Pre-conditions:
    /// - this node is not full (callers split first)
    /// - `key` is not in the subtree
    ///
    /// Full children met on the way down are split before descending.
    #[must_use]
    pub fn add<O: KeyOrder<K>>(&self, order: &O, key: K, value: V, fanout: usize) -> Self {
        debug_assert!(!self.is_full(fanout), "add into a full node");
        match self {
            Self::Leaf(leaf) => {
                let (j, matched) = position(leaf.find(order, &key));
                debug_assert!(!matched, "add of a key already present");
                let mut slots = Vec::with_capacity(leaf.slots.len() + 1);
                slots.extend_from_slice(&leaf.slots[..j]);
                slots.push((key, value));
                slots.extend_from_slice(&leaf.slots[j..]);
                Self::Leaf(Leaf::new(slots))
            }
            Self::Inner(inner) => {
                let (j, _) = position(inner.find(order, &key));
                if inner.child(j).is_full(fanout) {
                    // This node has room for the promoted half.
                    let split = inner.split_child(j);
                    let (j, _) = position(split.find(order, &key));
                    let child = Arc::new(split.child(j).add(order, key, value, fanout));
                    return Self::Inner(split.replace_child(j, child));
                }
                let child = Arc::new(inner.child(j).add(order, key, value, fanout));
                Self::Inner(inner.replace_child(j, child))
            }
        }
    }

    /// Create a new node with the value for `key` replaced.
    ///
    /// Hands the value back if `key` is not in the subtree.
    pub fn update<O: KeyOrder<K>>(&self, order: &O, key: &K, value: V) -> Result<Self, V> {
        match self {
            Self::Leaf(leaf) => {
                let Ok(j) = leaf.find(order, key) else {
                    return Err(value);
                };
                let mut slots = leaf.slots.clone();
                slots[j].1 = value;
                Ok(Self::Leaf(Leaf::new(slots)))
            }
            Self::Inner(inner) => {
                let (j, _) = position(inner.find(order, key));
                let child = Arc::new(inner.child(j).update(order, key, value)?);
                Ok(Self::Inner(inner.replace_child(j, child)))
            }
        }
    }

    /// Create a new node without `key`.
    ///
    /// Returns `None` if the node is left empty. Children that fall below
    /// the minimum occupancy are merged with a neighbour; the node itself
    /// may come back under-full and is rebalanced by its parent. An inner
    /// node may come back with no slots at all (only its greater child) when
    /// it is the root's last level to collapse.
    pub fn remove<O: KeyOrder<K>>(
        &self,
        order: &O,
        key: &K,
        config: &TreeConfig,
    ) -> Result<Option<Self>, TreeError> {
        match self {
            Self::Leaf(leaf) => {
                let j = leaf.find(order, key).map_err(|_| TreeError::MissingKey)?;
                if leaf.slots.len() == 1 {
                    return Ok(None);
                }
                let mut slots = Vec::with_capacity(leaf.slots.len() - 1);
                slots.extend_from_slice(&leaf.slots[..j]);
                slots.extend_from_slice(&leaf.slots[j + 1..]);
                Ok(Some(Self::Leaf(Leaf::new(slots))))
            }
            Self::Inner(inner) => {
                let (j, _) = position(inner.find(order, key));
                let removed = inner.child(j).remove(order, key, config)?;
                let (mut seps, mut children) = inner.parts();

                match removed {
                    None => {
                        // The emptied child goes with the separator to its left,
                        // or its own separator if it has one.
                        children.remove(j);
                        if j < seps.len() {
                            seps.remove(j);
                        } else {
                            seps.pop();
                        }
                    }
                    Some(child) => {
                        let underfull = child.slot_count() < config.min_slots();
                        children[j] = Arc::new(child);
                        if underfull && children.len() > 1 {
                            rebalance(&mut seps, &mut children, j, config.fanout())?;
                        }
                    }
                }

                if children.is_empty() {
                    return Ok(None);
                }
                Ok(Some(Self::Inner(Inner::from_parts(seps, children)?)))
            }
        }
    }

    /// Split this node in two under a new inner node.
    ///
    /// The result has one key and two children: the low half and the top
    /// half. Used when the root is full.
    #[must_use]
    pub fn split(&self) -> Self {
        let low = self.low_half();
        Self::Inner(Inner::new(vec![low], Arc::new(self.top_half())))
    }

    /// The low half of this node and the separator to promote with it.
    ///
    /// For a leaf the separator is the last key of the low half. For an
    /// inner node the middle slot is promoted: its key becomes the separator
    /// and its child becomes the low half's greater child.
    #[must_use]
    pub fn low_half(&self) -> (K, NodeRef<K, V>) {
        let m = self.slot_count() >> 1;
        match self {
            Self::Leaf(leaf) => {
                let low = leaf.slots[..m].to_vec();
                (leaf.slots[m - 1].0.clone(), Arc::new(Self::Leaf(Leaf::new(low))))
            }
            Self::Inner(inner) => {
                let (key, gtr) = &inner.slots[m - 1];
                let low = Inner::new(inner.slots[..m - 1].to_vec(), Arc::clone(gtr));
                (key.clone(), Arc::new(Self::Inner(low)))
            }
        }
    }

    /// The top half of this node, which stays in place after a split.
    #[must_use]
    pub fn top_half(&self) -> Self {
        let m = self.slot_count() >> 1;
        match self {
            Self::Leaf(leaf) => Self::Leaf(Leaf::new(leaf.slots[m..].to_vec())),
            Self::Inner(inner) => {
                Self::Inner(Inner::new(inner.slots[m..].to_vec(), Arc::clone(&inner.gtr)))
            }
        }
    }

    /// Merge two adjacent siblings separated by `sep` in their parent.
    fn merge(left: &Self, sep: K, right: &Self, fanout: usize) -> Result<Merged<K, V>, TreeError> {
        match (left, right) {
            (Self::Leaf(a), Self::Leaf(b)) => {
                let mut slots = Vec::with_capacity(a.slots.len() + b.slots.len());
                slots.extend_from_slice(&a.slots);
                slots.extend_from_slice(&b.slots);
                if slots.len() <= fanout {
                    return Ok(Merged::One(Self::Leaf(Leaf::new(slots))));
                }
                let upper = slots.split_off(slots.len() >> 1);
                let key = slots
                    .last()
                    .map(|(k, _)| k.clone())
                    .ok_or(TreeError::Corrupt("empty leaf in merge"))?;
                Ok(Merged::Two(
                    Self::Leaf(Leaf::new(slots)),
                    key,
                    Self::Leaf(Leaf::new(upper)),
                ))
            }
            (Self::Inner(a), Self::Inner(b)) => {
                let mut slots = Vec::with_capacity(a.slots.len() + b.slots.len() + 1);
                slots.extend_from_slice(&a.slots);
                slots.push((sep, Arc::clone(&a.gtr)));
                slots.extend_from_slice(&b.slots);
                if slots.len() <= fanout {
                    return Ok(Merged::One(Self::Inner(Inner::new(slots, Arc::clone(&b.gtr)))));
                }
                let mut upper = slots.split_off(slots.len() >> 1);
                let (key, low_gtr) = upper.remove(0);
                Ok(Merged::Two(
                    Self::Inner(Inner::new(slots, low_gtr)),
                    key,
                    Self::Inner(Inner::new(upper, Arc::clone(&b.gtr))),
                ))
            }
            _ => Err(TreeError::Corrupt("siblings at different depths")),
        }
    }
}

impl<K: Clone, V> Inner<K, V> {
    /// A copy of this node with child `j` (or the greater child) replaced.
    fn replace_child(&self, j: usize, child: NodeRef<K, V>) -> Self {
        if j == self.slots.len() {
            return Self::new(self.slots.clone(), child);
        }
        let mut slots = self.slots.clone();
        slots[j].1 = child;
        Self::new(slots, Arc::clone(&self.gtr))
    }
}

impl<K: Clone, V: Clone> Inner<K, V> {
    /// A copy of this node with the full child at position `j` split.
    ///
    /// Pre-condition: this node has room for one more slot.
    fn split_child(&self, j: usize) -> Self {
        let child = self.child(j);
        let low = child.low_half();
        let top = Arc::new(child.top_half());
        let mut slots = Vec::with_capacity(self.slots.len() + 1);
        slots.extend_from_slice(&self.slots[..j]);
        slots.push(low);
        if j == self.slots.len() {
            return Self::new(slots, top);
        }
        slots.push((self.slots[j].0.clone(), top));
        slots.extend_from_slice(&self.slots[j + 1..]);
        Self::new(slots, Arc::clone(&self.gtr))
    }
}

/// Restore minimum occupancy of `children[j]` by merging it with a neighbour.
fn rebalance<K: Clone, V: Clone>(
    seps: &mut Vec<K>,
    children: &mut Vec<NodeRef<K, V>>,
    j: usize,
    fanout: usize,
) -> Result<(), TreeError> {
    let left = if j + 1 < children.len() { j } else { j - 1 };
    let right = left + 1;
    match Node::merge(&children[left], seps[left].clone(), &children[right], fanout)? {
        Merged::One(node) => {
            children[left] = Arc::new(node);
            children.remove(right);
            seps.remove(left);
        }
        Merged::Two(low, key, high) => {
            children[left] = Arc::new(low);
            children[right] = Arc::new(high);
            seps[left] = key;
        }
    }
    Ok(())
}
