//! Lookup operation — traverses the trie to find a key.

use crate::node::{self, BitmapIndexedNode};

/// Searches for `key` in the subtree rooted at `root`.
///
/// Returns a reference to the value if found.
pub(crate) fn get<'a, K, V>(root: &'a BitmapIndexedNode<K, V>, key: &K, hash: u64) -> Option<&'a V>
where
    K: Eq,
{
    node::get(root, key, hash, 0)
}
