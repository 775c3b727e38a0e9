//! Removal operation — exclusive-ownership-aware path update with
//! canonical inlining.

use std::rc::Rc;

use crate::node::{self, BitmapIndexedNode, RemovedSubtree, RemoveOutcome};
use crate::ownership::is_unique;

/// What [`remove`] hands back to the map handle.
pub(crate) enum Removal<K, V> {
    /// The key was absent; carries the root back unchanged so the caller
    /// (which took it out of `&mut HamtMap` via `mem::take`) can restore it.
    NotFound(Rc<BitmapIndexedNode<K, V>>),
    Removed { root: Rc<BitmapIndexedNode<K, V>>, removed_value: V },
}

/// Removes `key` from `root`, returning the new root (or a fresh empty node
/// if the trie became empty) together with the value that was removed.
pub(crate) fn remove<K, V>(root: Rc<BitmapIndexedNode<K, V>>, key: &K, hash: u64) -> Removal<K, V>
where
    K: Eq + Clone,
    V: Clone,
{
    let exclusive = is_unique(&root);
    match node::remove(root, exclusive, key, hash, 0) {
        RemoveOutcome::NotFound(root) => Removal::NotFound(root),
        RemoveOutcome::Removed { subtree, removed_value } => {
            let root = match subtree {
                RemovedSubtree::Empty => Rc::new(BitmapIndexedNode::empty()),
                // At the literal root, a single residual payload/collision
                // has nowhere to escalate to — it simply becomes the root's
                // one and only slot.
                RemovedSubtree::SinglePayload(entry) => {
                    Rc::new(node::singleton_payload(entry))
                }
                RemovedSubtree::SingleCollision(leaf) => {
                    Rc::new(node::singleton_collision(leaf))
                }
                RemovedSubtree::Node(node) => node,
            };
            Removal::Removed { root, removed_value }
        }
    }
}
