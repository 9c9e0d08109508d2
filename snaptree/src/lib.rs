#![cfg_attr(test, allow(clippy::disallowed_methods, clippy::expect_used))]
// Data structures for the engine's indexes:
// 1. Trees are immutable; every change returns a new version
// 2. Versions share every node off the changed path
// 3. Cursors walk one version and keep it alive
// 4. The only shared mutable state is which version is current
//
// System components:
//  - Persistent B-tree (tree)
//  - Current-version holder (shared)
//  - Boundary types for the layers above (bookmark, error, protocol)

pub mod bookmark;
pub mod config;
pub mod error;
pub mod protocol;
pub mod shared;
pub mod tree;

#[cfg(test)]
mod simulation;
#[cfg(test)]
mod testing;

pub use bookmark::RowBookmark;
pub use config::{ConfigError, TreeConfig};
pub use error::{DatabaseError, EngineError, TreeError};
pub use shared::SharedTree;
pub use tree::{Cursor, MultiTree, Tree};
