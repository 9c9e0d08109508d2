//! Immutable cursors over a tree.
//!
//! A cursor is a stack of `(node, position)` frames from a leaf up to the
//! root. Frames are shared between a cursor and the cursors stepped from it,
//! and a cursor keeps the nodes it walks alive, so it stays valid after the
//! tree it came from has been replaced by a newer version.
//!
//! Stepping never changes a cursor: `next()` and `previous()` return a new
//! one, or `None` once the traversal runs off either end.

use std::sync::Arc;

use crate::error::TreeError;
use crate::tree::node::{Node, NodeRef, Slot};
use crate::tree::order::KeyOrder;
use crate::tree::tree::Tree;

/// A position in a tree.
pub struct Cursor<K, V> {
    frame: Arc<Frame<K, V>>,
}

struct Frame<K, V> {
    node: NodeRef<K, V>,
    /// Slot index; equal to the slot count for an inner node's greater child.
    pos: usize,
    parent: Option<Arc<Self>>,
}

impl<K, V> Clone for Cursor<K, V> {
    fn clone(&self) -> Self {
        Self {
            frame: Arc::clone(&self.frame),
        }
    }
}

impl<K: std::fmt::Debug, V> std::fmt::Debug for Cursor<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("key", self.key())
            .field("position", &self.position())
            .finish()
    }
}

/// The child under position `pos`, or `None` when the payload there is a value.
pub(super) fn child_at<K, V>(node: &Node<K, V>, pos: usize) -> Option<&NodeRef<K, V>> {
    if pos < node.slot_count() {
        match node.slot(pos).1 {
            Slot::Child(child) => Some(child),
            Slot::Value(_) => None,
        }
    } else {
        node.gtr()
    }
}

fn push<K, V>(node: NodeRef<K, V>, pos: usize, parent: Option<Arc<Frame<K, V>>>) -> Arc<Frame<K, V>> {
    Arc::new(Frame { node, pos, parent })
}

impl<K, V> Cursor<K, V> {
    /// The key at the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor's frame does not point at a slot, which only a
    /// corrupted tree can produce.
    #[must_use]
    pub fn key(&self) -> &K {
        self.frame.node.slot(self.frame.pos).0
    }

    /// The value at the cursor.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Corrupt` if the cursor's frame holds a child
    /// subtree rather than a value.
    pub fn value(&self) -> Result<&V, TreeError> {
        let frame = &self.frame;
        if frame.pos >= frame.node.slot_count() {
            return Err(TreeError::Corrupt("cursor past the end of its node"));
        }
        match frame.node.slot(frame.pos).1 {
            Slot::Value(value) => Ok(value),
            Slot::Child(_) => Err(TreeError::Corrupt("cursor stopped at a child subtree")),
        }
    }

    /// The rank of the entry at the cursor, counting from 0.
    ///
    /// Walks every frame, so the cost is proportional to the tree height.
    #[must_use]
    pub fn position(&self) -> u64 {
        let mut rank = 0;
        let mut frame = Some(&self.frame);
        while let Some(f) = frame {
            rank += f.node.total_before(f.pos);
            frame = f.parent.as_ref();
        }
        rank
    }

    /// The cursor at the next entry, or `None` at the end of the tree.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        let mut f = &self.frame;
        // Pop until a frame has a position left.
        while f.pos >= f.node.end_pos() {
            f = f.parent.as_ref()?;
        }
        let frame = push(Arc::clone(&f.node), f.pos + 1, f.parent.clone());
        Some(Self::leftmost(frame))
    }

    /// The cursor at the previous entry, or `None` at the start of the tree.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        let mut f = &self.frame;
        while f.pos == 0 {
            f = f.parent.as_ref()?;
        }
        let frame = push(Arc::clone(&f.node), f.pos - 1, f.parent.clone());
        Some(Self::rightmost(frame))
    }

    /// Step forward from `cursor`, or start at the first entry of `tree`.
    ///
    /// `tree` is only consulted when `cursor` is `None`.
    #[must_use]
    pub fn next_from<O>(cursor: Option<&Self>, tree: Option<&Tree<K, V, O>>) -> Option<Self> {
        cursor.map_or_else(
            || {
                let root = Arc::clone(tree?.root()?);
                Some(Self::leftmost(push(root, 0, None)))
            },
            Self::next,
        )
    }

    /// Step backward from `cursor`, or start at the last entry of `tree`.
    ///
    /// `tree` is only consulted when `cursor` is `None`.
    #[must_use]
    pub fn previous_from<O>(cursor: Option<&Self>, tree: Option<&Tree<K, V, O>>) -> Option<Self> {
        cursor.map_or_else(
            || {
                let root = Arc::clone(tree?.root()?);
                let end = root.end_pos();
                Some(Self::rightmost(push(root, end, None)))
            },
            Self::previous,
        )
    }

    /// Descend to the leftmost value under the frame's position.
    fn leftmost(mut frame: Arc<Frame<K, V>>) -> Self {
        loop {
            let Some(child) = child_at(&frame.node, frame.pos).cloned() else {
                return Self { frame };
            };
            frame = push(child, 0, Some(frame));
        }
    }

    /// Descend to the rightmost value under the frame's position.
    fn rightmost(mut frame: Arc<Frame<K, V>>) -> Self {
        loop {
            let Some(child) = child_at(&frame.node, frame.pos).cloned() else {
                return Self { frame };
            };
            let end = child.end_pos();
            frame = push(child, end, Some(frame));
        }
    }

    /// The cursor at the least key `>= key` under `root`.
    ///
    /// At each level the search takes the position where `key` would be
    /// inserted. If that runs past the end of the leaf (the key is above
    /// every key there) the cursor steps on to the next entry.
    #[must_use]
    pub(crate) fn seek<O: KeyOrder<K>>(root: &NodeRef<K, V>, order: &O, key: &K) -> Option<Self> {
        let mut parent = None;
        let mut node = Arc::clone(root);
        loop {
            let (pos, _) = node.position_for(order, key);
            if node.is_leaf() {
                if pos < node.slot_count() {
                    return Some(Self {
                        frame: push(node, pos, parent),
                    });
                }
                let last = node.end_pos();
                return Self {
                    frame: push(node, last, parent),
                }
                .next();
            }
            let child = child_at(&node, pos).cloned()?;
            parent = Some(push(node, pos, parent));
            node = child;
        }
    }
}
