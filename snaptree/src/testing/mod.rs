//! Helpers shared by the test modules.

use crate::config::TreeConfig;
use crate::tree::Tree;

/// A tree holding `1..=n`, each key mapped to itself.
pub fn ascending_tree(n: i64, config: TreeConfig) -> Tree<i64, i64> {
    (1..=n).fold(Tree::with_config(config), |tree, k| tree.add(k, k))
}

/// Walk the tree with `first()` and `next()`, collecting each entry with
/// the position the cursor reports for it.
pub fn forward_entries<K: Clone, V: Clone, O>(tree: &Tree<K, V, O>) -> Vec<(K, V, u64)> {
    let mut entries = Vec::new();
    let mut cursor = tree.first();
    while let Some(c) = cursor {
        let value = c.value().expect("cursor rests on a value").clone();
        entries.push((c.key().clone(), value, c.position()));
        cursor = c.next();
    }
    entries
}

/// Walk the tree with `last()` and `previous()`, in that order.
pub fn backward_entries<K: Clone, V: Clone, O>(tree: &Tree<K, V, O>) -> Vec<(K, V, u64)> {
    let mut entries = Vec::new();
    let mut cursor = tree.last();
    while let Some(c) = cursor {
        let value = c.value().expect("cursor rests on a value").clone();
        entries.push((c.key().clone(), value, c.position()));
        cursor = c.previous();
    }
    entries
}
