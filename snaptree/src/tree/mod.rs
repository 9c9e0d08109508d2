//! Persistent B-tree for the engine's in-memory indexes.
//!
//! This module provides an immutable ordered map with structural sharing:
//! every change returns a new tree and leaves the old one intact.
//!
//! # Structure
//!
//! The tree consists of:
//! - Inner nodes: store separator keys and child subtrees, plus a greater child
//! - Leaf nodes: store key-value pairs
//!
//! Nodes are held through `Arc`, so a new version shares every subtree off
//! the changed path with the versions before it.
//!
//! # Usage
//!
//! ```
//! use snaptree::tree::Tree;
//!
//! let empty = Tree::new();
//! let one = empty.add(1_i64, "one");
//! let two = one.add(2, "two");
//!
//! assert_eq!(empty.count(), 0);
//! assert_eq!(one.count(), 1);
//! assert_eq!(two.lookup(&2), Some(&"two"));
//! assert_eq!(two.first().map(|c| *c.key()), Some(1));
//! ```

mod cursor;
mod multi;
mod node;
mod order;
mod render;
#[allow(clippy::module_inception)]
mod tree;

pub use cursor::Cursor;
pub use multi::MultiTree;
pub use node::{Inner, Leaf, Node, NodeRef, Slot};
pub use order::{Descending, KeyOrder, Natural};
pub use render::{RenderKey, uid};
pub use tree::{Iter, Tree};
