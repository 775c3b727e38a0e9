//! Insert/overwrite operation — exclusive-ownership-aware path update.

use std::rc::Rc;

use crate::effect::Effect;
use crate::node::{self, BitmapIndexedNode};
use crate::ownership::is_unique;

/// Inserts `key` -> `value` into `root`, returning the new root and
/// recording in `effect` whether the key was new and what it displaced.
///
/// Exclusivity is probed directly off `root`'s strong count — the caller
/// is expected to have just taken it out of a `&mut HamtMap` via
/// [`std::mem::take`], so a count of 1 here means no snapshot is sharing
/// this subtree.
pub(crate) fn update<K, V>(root: Rc<BitmapIndexedNode<K, V>>, key: K, value: V, hash: u64, effect: &mut Effect<V>) -> Rc<BitmapIndexedNode<K, V>>
where
    K: Eq + Clone,
    V: Clone,
{
    let exclusive = is_unique(&root);
    node::update(root, exclusive, key, value, hash, 0, effect)
}
