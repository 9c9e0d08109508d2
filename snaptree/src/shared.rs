//! The current version of a tree, shared between threads.
//!
//! Trees themselves are immutable and need no locking. What does change is
//! which version is current: writers build a new tree from the current one
//! and swap it in. `SharedTree` holds that reference behind a `RwLock`.
//!
//! # Thread Safety
//!
//! - `snapshot()` takes the read lock only long enough to clone the handle;
//!   traversal of the snapshot happens without any lock
//! - `update()` holds the write lock while the new version is built, so
//!   concurrent writers are serialised and no update is lost
//!
//! # Invariants
//!
//! - A snapshot never changes, whatever writers do afterwards

use std::sync::RwLock;

use crate::error::TreeError;
use crate::tree::{KeyOrder, Natural, Tree};

/// A lock-guarded reference to the current version of a tree.
#[derive(Debug)]
pub struct SharedTree<K, V, O = Natural> {
    current: RwLock<Tree<K, V, O>>,
}

impl<K, V, O: KeyOrder<K> + Clone> SharedTree<K, V, O> {
    #[must_use]
    pub const fn new(tree: Tree<K, V, O>) -> Self {
        Self {
            current: RwLock::new(tree),
        }
    }

    /// Clone the current version.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::LockPoisoned` if a writer panicked while holding
    /// the lock.
    pub fn snapshot(&self) -> Result<Tree<K, V, O>, TreeError> {
        let current = self.current.read().map_err(|_| TreeError::LockPoisoned)?;
        Ok(current.clone())
    }

    /// Number of associations in the current version.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::LockPoisoned` if the lock is poisoned.
    pub fn count(&self) -> Result<u64, TreeError> {
        let current = self.current.read().map_err(|_| TreeError::LockPoisoned)?;
        Ok(current.count())
    }

    /// Build a new version from the current one and make it current.
    ///
    /// If `f` fails the current version is left as it was. Returns the
    /// version that was installed.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or `TreeError::LockPoisoned`.
    pub fn update<F>(&self, f: F) -> Result<Tree<K, V, O>, TreeError>
    where
        F: FnOnce(&Tree<K, V, O>) -> Result<Tree<K, V, O>, TreeError>,
    {
        let mut current = self.current.write().map_err(|_| TreeError::LockPoisoned)?;
        let next = f(&current)?;
        tracing::trace!(
            before = current.count(),
            after = next.count(),
            "installing new tree version"
        );
        *current = next.clone();
        drop(current);
        Ok(next)
    }

    /// Make `tree` the current version, returning the one it replaces.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::LockPoisoned` if the lock is poisoned.
    pub fn replace(&self, tree: Tree<K, V, O>) -> Result<Tree<K, V, O>, TreeError> {
        let mut current = self.current.write().map_err(|_| TreeError::LockPoisoned)?;
        tracing::trace!(count = tree.count(), "replacing tree version");
        Ok(std::mem::replace(&mut *current, tree))
    }
}

impl<K, V, O: Default> Default for SharedTree<K, V, O> {
    fn default() -> Self {
        Self {
            current: RwLock::new(Tree::default()),
        }
    }
}
