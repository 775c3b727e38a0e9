//! The persistent map handle.

use std::fmt;
use std::hash::Hash;
use std::ops;
use std::rc::Rc;

use crate::effect::Effect;
use crate::error::DuplicateKeyError;
use crate::hash::hash_one;
use crate::iter::{Iter, IterRev};
use crate::node::BitmapIndexedNode;
use crate::ops::get::get;
use crate::ops::remove::{remove, Removal};
use crate::ops::update::update;

/// A persistent (immutable, structurally-shared) hash map.
///
/// Cloning a `HamtMap` is O(1): the clone shares the same root `Rc` and
/// diverges only on the next mutation, which path-copies just the nodes on
/// the path to the changed key (or edits them in place when this handle
/// turns out to be the sole owner of that path).
pub struct HamtMap<K, V> {
    root: Rc<BitmapIndexedNode<K, V>>,
    size: usize,
}

impl<K, V> HamtMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Rc::new(BitmapIndexedNode::empty()),
            size: 0,
        }
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Identity of the root node, for structural-sharing assertions in tests.
    #[cfg(test)]
    pub(crate) fn root_ptr(&self) -> *const BitmapIndexedNode<K, V> {
        Rc::as_ptr(&self.root)
    }

    /// Finds a key sitting beside a collision leaf under a node that is not
    /// its parent's sole occupant. See
    /// [`BitmapIndexedNode::find_payload_beside_collision_leaf`].
    #[cfg(test)]
    pub(crate) fn find_payload_beside_collision_leaf(&self) -> Option<K>
    where
        K: Clone,
    {
        self.root.find_payload_beside_collision_leaf()
    }
}

impl<K: Hash + Eq, V> HamtMap<K, V> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        get(&self.root, key, hash_one(key))
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns a reference to the value for `key`, or `default` if absent.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }
}

impl<K: Hash + Eq + Clone, V: Clone> HamtMap<K, V> {
    /// Inserts a key-value pair into the map.
    ///
    /// Returns `None` if the key was new, or `Some(old_value)` if an
    /// existing value was replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = hash_one(&key);
        let root = std::mem::take(&mut self.root);
        let mut effect = Effect::new();
        self.root = update(root, key, value, hash, &mut effect);
        if effect.replaced_value.is_none() {
            self.size += 1;
        }
        effect.replaced_value
    }

    /// Removes a key from the map. Returns the removed value, or `None` if
    /// the key was not present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let hash = hash_one(key);
        let root = std::mem::take(&mut self.root);
        match remove(root, key, hash) {
            Removal::NotFound(root) => {
                self.root = root;
                None
            }
            Removal::Removed { root, removed_value } => {
                self.root = root;
                self.size -= 1;
                Some(removed_value)
            }
        }
    }

    /// Builds a map from an iterator of pairs, rejecting repeated keys.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateKeyError`] on the first key that repeats an
    /// earlier one in `iter`; the partially-built map is discarded.
    pub fn from_unique_iter<I>(iter: I) -> Result<Self, DuplicateKeyError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::new();
        for (key, value) in iter {
            if map.insert(key, value).is_some() {
                return Err(DuplicateKeyError);
            }
        }
        Ok(map)
    }
}

impl<K, V> HamtMap<K, V> {
    /// Returns a forward pre-order iterator over `(&K, &V)` pairs.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.root, self.size)
    }

    /// Returns a reverse pre-order iterator over `(&K, &V)` pairs.
    #[must_use]
    pub fn iter_rev(&self) -> IterRev<'_, K, V> {
        IterRev::new(&self.root, self.size)
    }
}

impl<K, V> Default for HamtMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for HamtMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: Rc::clone(&self.root),
            size: self.size,
        }
    }
}

impl<K, V> fmt::Debug for HamtMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HamtMap").field("len", &self.size).finish_non_exhaustive()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for HamtMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }
        if Rc::ptr_eq(&self.root, &other.root) {
            return true;
        }
        self.iter().all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl<K: Hash + Eq, V: Eq> Eq for HamtMap<K, V> {}

impl<K: Hash + Eq + Clone, V: Clone> Extend<(K, V)> for HamtMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone> FromIterator<(K, V)> for HamtMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Hash + Eq, V> ops::Index<&K> for HamtMap<K, V> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<'a, K, V> IntoIterator for &'a HamtMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
