//! The HAMT node engine: bitmap-indexed inner nodes, the hash-collision
//! leaf, and the local structural transformations between them.
//!
//! A node stores two physical 32-bit bitmaps and derives three disjoint
//! logical occupancy maps from them:
//!
//! ```text
//! collMap = bitmap1 & bitmap2
//! dataMap = bitmap1 ^ collMap
//! nodeMap = bitmap2 ^ collMap
//! ```
//!
//! This is the CHAMP two-bitmap encoding: it distinguishes inline payload,
//! child-node, and child-collision-leaf slots using only two machine words
//! of header. Code outside this module must never read `bitmap1`/`bitmap2`
//! directly — only the derived maps.

use std::rc::Rc;

use crate::bits::{self, BITS_PER_LEVEL, MAX_SHIFT};
use crate::effect::Effect;
use crate::ownership::is_unique;

/// An inline (key, value) pair together with its precomputed hash.
#[derive(Clone)]
pub(crate) struct Entry<K, V> {
    pub hash: u64,
    pub key: K,
    pub value: V,
}

/// Bucket of entries sharing one full hash. Never holds fewer than two
/// entries — a one-entry residue is always inlined by the parent.
pub(crate) struct HashCollisionLeaf<K, V> {
    pub(crate) hash: u64,
    pub(crate) entries: Vec<Entry<K, V>>,
}

impl<K, V> HashCollisionLeaf<K, V> {
    fn new(hash: u64, entries: Vec<Entry<K, V>>) -> Self {
        debug_assert!(entries.len() >= 2, "collision leaf must hold >= 2 entries");
        debug_assert!(entries.iter().all(|e| e.hash == hash));
        Self { hash, entries }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Clone, V: Clone> Clone for HashCollisionLeaf<K, V> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash,
            entries: self.entries.clone(),
        }
    }
}

/// A bitmap-indexed inner node of the trie.
pub(crate) struct BitmapIndexedNode<K, V> {
    bitmap1: u32,
    bitmap2: u32,
    /// Inline payloads, ascending slot-bit order — the `dataMap` region.
    entries: Vec<Entry<K, V>>,
    /// Bitmap-indexed children, ascending slot-bit order — the `nodeMap`
    /// region.
    children: Vec<Rc<BitmapIndexedNode<K, V>>>,
    /// Hash-collision children, ascending slot-bit order — the `collMap`
    /// region.
    collisions: Vec<Rc<HashCollisionLeaf<K, V>>>,
}

impl<K, V> Default for BitmapIndexedNode<K, V> {
    fn default() -> Self {
        Self {
            bitmap1: 0,
            bitmap2: 0,
            entries: Vec::new(),
            children: Vec::new(),
            collisions: Vec::new(),
        }
    }
}

impl<K: Clone, V: Clone> Clone for BitmapIndexedNode<K, V> {
    fn clone(&self) -> Self {
        Self {
            bitmap1: self.bitmap1,
            bitmap2: self.bitmap2,
            entries: self.entries.clone(),
            children: self.children.clone(), // Rc::clone per element, not per subtree.
            collisions: self.collisions.clone(),
        }
    }
}

impl<K, V> BitmapIndexedNode<K, V> {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn data_map(&self) -> u32 {
        self.bitmap1 ^ self.coll_map()
    }

    #[inline]
    pub(crate) fn node_map(&self) -> u32 {
        self.bitmap2 ^ self.coll_map()
    }

    #[inline]
    pub(crate) fn coll_map(&self) -> u32 {
        self.bitmap1 & self.bitmap2
    }

    /// Total logical entry count of the subtree rooted at this node.
    pub(crate) fn count(&self) -> usize {
        self.entries.len()
            + self.children.iter().map(|c| c.count()).sum::<usize>()
            + self.collisions.iter().map(|c| c.len()).sum::<usize>()
    }

    /// Number of occupied slots at this node alone (not recursive).
    fn local_arity(&self) -> usize {
        self.entries.len() + self.children.len() + self.collisions.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.local_arity() == 0
    }

    pub(crate) fn entries(&self) -> &[Entry<K, V>] {
        &self.entries
    }

    pub(crate) fn children(&self) -> &[Rc<BitmapIndexedNode<K, V>>] {
        &self.children
    }

    pub(crate) fn collisions(&self) -> &[Rc<HashCollisionLeaf<K, V>>] {
        &self.collisions
    }

    /// Test-only introspection: finds a key whose node holds exactly one
    /// inline payload plus one collision leaf and nothing else, while that
    /// node's own parent still has other occupants. Removing that key is
    /// the shape that forces the `(1,0,1)` deletion case to escalate into
    /// an ancestor via `migrate_node_to_collision`, rather than being
    /// handed back unchanged because the node was its parent's sole
    /// occupant.
    #[cfg(test)]
    pub(crate) fn find_payload_beside_collision_leaf(&self) -> Option<K>
    where
        K: Clone,
    {
        fn walk<K: Clone, V>(node: &BitmapIndexedNode<K, V>, node_has_sibling: bool) -> Option<K> {
            if node_has_sibling && node.entries.len() == 1 && node.children.is_empty() && node.collisions.len() == 1 {
                return Some(node.entries[0].key.clone());
            }
            let child_has_sibling = node.local_arity() > 1;
            for child in &node.children {
                if let Some(key) = walk(child, child_has_sibling) {
                    return Some(key);
                }
            }
            None
        }
        walk(self, false)
    }

    // -- slot migrations -----------------------------------------------
    //
    // Six migrations are reachable across insert/remove; node -> collision
    // is the one easy to miss, reachable only from remove's "unwrap a
    // single-collision-leaf carrier subtree" step.

    fn migrate_inline_to_node(&mut self, bit: u32) {
        self.bitmap1 &= !bit;
        self.bitmap2 |= bit;
    }

    fn migrate_inline_to_collision(&mut self, bit: u32) {
        self.bitmap2 |= bit;
    }

    fn migrate_node_to_inline(&mut self, bit: u32) {
        self.bitmap1 |= bit;
        self.bitmap2 &= !bit;
    }

    fn migrate_collision_to_inline(&mut self, bit: u32) {
        self.bitmap2 &= !bit;
    }

    fn migrate_collision_to_node(&mut self, bit: u32) {
        self.bitmap1 &= !bit;
    }

    fn migrate_node_to_collision(&mut self, bit: u32) {
        self.bitmap1 |= bit;
    }

    #[inline]
    fn data_index(&self, bit: u32) -> usize {
        bits::popcount_below(self.data_map(), bit)
    }

    #[inline]
    fn node_index(&self, bit: u32) -> usize {
        bits::popcount_below(self.node_map(), bit)
    }

    #[inline]
    fn coll_index(&self, bit: u32) -> usize {
        bits::popcount_below(self.coll_map(), bit)
    }
}

/// Builds a fresh root holding exactly one inline payload, bit-positioned
/// by its hash fragment at shift 0.
///
/// Only meaningful at the literal trie root: a [`RemovedSubtree::SinglePayload`]
/// surfacing from any deeper level is always escalated to its parent
/// unchanged instead, since only the root has no parent slot to carry it.
pub(crate) fn singleton_payload<K, V>(entry: Entry<K, V>) -> BitmapIndexedNode<K, V> {
    let bit = bits::bitpos(bits::fragment(entry.hash, 0));
    let mut n = BitmapIndexedNode::default();
    n.bitmap1 |= bit;
    n.entries.push(entry);
    n
}

/// Builds a fresh root holding exactly one collision leaf, bit-positioned
/// by its shared hash fragment at shift 0. Root-only, for the same reason
/// as [`singleton_payload`].
pub(crate) fn singleton_collision<K, V>(leaf: Rc<HashCollisionLeaf<K, V>>) -> BitmapIndexedNode<K, V> {
    let bit = bits::bitpos(bits::fragment(leaf.hash, 0));
    let mut n = BitmapIndexedNode::default();
    n.bitmap1 |= bit;
    n.bitmap2 |= bit;
    n.collisions.push(leaf);
    n
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Searches for `key` in the subtree rooted at `node`.
pub(crate) fn get<'a, K: Eq, V>(node: &'a BitmapIndexedNode<K, V>, key: &K, hash: u64, shift: u32) -> Option<&'a V> {
    let frag = bits::fragment(hash, shift);
    let bit = bits::bitpos(frag);

    if node.data_map() & bit != 0 {
        let entry = &node.entries[node.data_index(bit)];
        if entry.hash == hash && entry.key == *key {
            Some(&entry.value)
        } else {
            None
        }
    } else if node.node_map() & bit != 0 {
        let child = &node.children[node.node_index(bit)];
        get(child, key, hash, shift + BITS_PER_LEVEL)
    } else if node.coll_map() & bit != 0 {
        let leaf = &node.collisions[node.coll_index(bit)];
        get_from_leaf(leaf, key, hash)
    } else {
        None
    }
}

fn get_from_leaf<'a, K: Eq, V>(leaf: &'a HashCollisionLeaf<K, V>, key: &K, hash: u64) -> Option<&'a V> {
    if leaf.hash != hash {
        return None;
    }
    leaf.entries.iter().find(|e| e.key == *key).map(|e| &e.value)
}

// ---------------------------------------------------------------------------
// Update (insert/overwrite)
// ---------------------------------------------------------------------------

/// One side of a two-way split: either a bare entry or an existing
/// collision leaf being displaced one level down.
enum Side<K, V> {
    Entry(Entry<K, V>),
    Collision(Rc<HashCollisionLeaf<K, V>>),
}

impl<K, V> Side<K, V> {
    fn hash(&self) -> u64 {
        match self {
            Self::Entry(e) => e.hash,
            Self::Collision(c) => c.hash,
        }
    }
}

/// Inserts `key` -> `value` into the subtree rooted at `node`, returning the
/// (possibly reused) root of that subtree.
///
/// `exclusive` asserts the caller holds the only outstanding reference to
/// `node`; when true, the local buffers are edited in place instead of
/// cloned. The flag is not cached across the call — each recursion frame
/// re-derives its own child's exclusivity via [`is_unique`].
pub(crate) fn update<K, V>(
    mut node: Rc<BitmapIndexedNode<K, V>>,
    exclusive: bool,
    key: K,
    value: V,
    hash: u64,
    shift: u32,
    effect: &mut Effect<V>,
) -> Rc<BitmapIndexedNode<K, V>>
where
    K: Eq + Clone,
    V: Clone,
{
    let frag = bits::fragment(hash, shift);
    let bit = bits::bitpos(frag);

    if node.data_map() & bit != 0 {
        let pos = node.data_index(bit);
        let existing = &node.entries[pos];

        if existing.key == key {
            effect.modified = true;
            effect.replaced_value = Some(existing.value.clone());
            let new_entry = Entry { hash, key, value };
            with_node(&mut node, exclusive, |n| n.entries[pos] = new_entry);
            return node;
        }

        if existing.hash == hash {
            // Inline -> collision: full-hash collision between two payloads.
            effect.modified = true;
            let existing = existing.clone();
            let leaf = Rc::new(HashCollisionLeaf::new(hash, vec![existing, Entry { hash, key, value }]));
            with_node(&mut node, exclusive, |n| {
                n.entries.remove(pos);
                n.migrate_inline_to_collision(bit);
                let idx = n.coll_index(bit);
                n.collisions.insert(idx, leaf.clone());
            });
            return node;
        }

        // Inline -> node: hashes differ, split into a fresh chain.
        effect.modified = true;
        let existing = existing.clone();
        let subtree = build_split_chain(
            Side::Entry(existing),
            Side::Entry(Entry { hash, key, value }),
            shift + BITS_PER_LEVEL,
        );
        with_node(&mut node, exclusive, |n| {
            n.entries.remove(pos);
            n.migrate_inline_to_node(bit);
            let idx = n.node_index(bit);
            n.children.insert(idx, subtree.clone());
        });
        node
    } else if node.node_map() & bit != 0 {
        let idx = node.node_index(bit);
        let (child, child_exclusive) = take_child(&mut node, exclusive, idx);
        let new_child = update(child, child_exclusive, key, value, hash, shift + BITS_PER_LEVEL, effect);
        restore_child(&mut node, exclusive, idx, new_child);
        node
    } else if node.coll_map() & bit != 0 {
        let idx = node.coll_index(bit);
        if node.collisions[idx].hash == hash {
            let (leaf, leaf_exclusive) = take_collision(&mut node, exclusive, idx);
            let new_leaf = update_leaf(leaf, leaf_exclusive, key, value, hash, effect);
            restore_collision(&mut node, exclusive, idx, new_leaf);
            node
        } else {
            // Collision -> node: a new key whose hash diverges from this
            // bucket's shared hash at some deeper level.
            effect.modified = true;
            let leaf = Rc::clone(&node.collisions[idx]);
            let subtree = build_split_chain(
                Side::Collision(leaf),
                Side::Entry(Entry { hash, key, value }),
                shift + BITS_PER_LEVEL,
            );
            with_node(&mut node, exclusive, |n| {
                n.migrate_collision_to_node(bit);
                n.collisions.remove(idx);
                let new_idx = n.node_index(bit);
                n.children.insert(new_idx, subtree.clone());
            });
            node
        }
    } else {
        effect.modified = true;
        with_node(&mut node, exclusive, |n| {
            n.bitmap1 |= bit;
            let idx = n.data_index(bit);
            n.entries.insert(idx, Entry { hash, key, value });
        });
        node
    }
}

/// Runs `edit` against `node` in place if `exclusive`, otherwise against a
/// fresh clone, reassigning `*node` either way.
fn with_node<K, V>(node: &mut Rc<BitmapIndexedNode<K, V>>, exclusive: bool, edit: impl FnOnce(&mut BitmapIndexedNode<K, V>))
where
    K: Clone,
    V: Clone,
{
    if exclusive {
        let inner = Rc::get_mut(node).expect("exclusive implies unique ownership");
        edit(inner);
    } else {
        let mut cloned = (**node).clone();
        edit(&mut cloned);
        *node = Rc::new(cloned);
    }
}

fn update_leaf<K, V>(
    mut leaf: Rc<HashCollisionLeaf<K, V>>,
    exclusive: bool,
    key: K,
    value: V,
    hash: u64,
    effect: &mut Effect<V>,
) -> Rc<HashCollisionLeaf<K, V>>
where
    K: Eq + Clone,
    V: Clone,
{
    let existing_pos = leaf.entries.iter().position(|e| e.key == key);
    effect.modified = true;

    match existing_pos {
        Some(pos) => {
            effect.replaced_value = Some(leaf.entries[pos].value.clone());
            let new_entry = Entry { hash, key, value };
            with_leaf(&mut leaf, exclusive, |l| l.entries[pos] = new_entry);
        }
        None => {
            with_leaf(&mut leaf, exclusive, |l| l.entries.push(Entry { hash, key, value }));
        }
    }
    leaf
}

fn with_leaf<K, V>(leaf: &mut Rc<HashCollisionLeaf<K, V>>, exclusive: bool, edit: impl FnOnce(&mut HashCollisionLeaf<K, V>))
where
    K: Clone,
    V: Clone,
{
    if exclusive {
        let inner = Rc::get_mut(leaf).expect("exclusive implies unique ownership");
        edit(inner);
    } else {
        let mut cloned = (**leaf).clone();
        edit(&mut cloned);
        *leaf = Rc::new(cloned);
    }
}

/// Takes the child `Rc` at `idx` out of `node.children` for recursion.
///
/// When `exclusive`, the slot is first swapped for a cheap placeholder
/// instead of cloned — cloning would leave the original reference sitting
/// in `node.children[idx]` for the duration of the recursive call, so the
/// extracted `Rc`'s own strong count would read 2 instead of 1 and the
/// recursion's own `Rc::get_mut` would wrongly see a shared node and panic,
/// even though this node is the only logical owner. Pair with
/// [`restore_child`].
fn take_child<K, V>(node: &mut Rc<BitmapIndexedNode<K, V>>, exclusive: bool, idx: usize) -> (Rc<BitmapIndexedNode<K, V>>, bool)
where
    K: Clone,
    V: Clone,
{
    let child_exclusive = exclusive && is_unique(&node.children[idx]);
    let child = if exclusive {
        let inner = Rc::get_mut(node).expect("exclusive implies unique ownership");
        std::mem::replace(&mut inner.children[idx], Rc::new(BitmapIndexedNode::default()))
    } else {
        Rc::clone(&node.children[idx])
    };
    (child, child_exclusive)
}

/// Writes the (possibly unchanged) child back into `node.children[idx]`
/// after recursion. Counterpart to [`take_child`].
fn restore_child<K, V>(node: &mut Rc<BitmapIndexedNode<K, V>>, exclusive: bool, idx: usize, child: Rc<BitmapIndexedNode<K, V>>)
where
    K: Clone,
    V: Clone,
{
    if exclusive {
        let inner = Rc::get_mut(node).expect("exclusive implies unique ownership");
        inner.children[idx] = child;
    } else if !Rc::ptr_eq(&child, &node.children[idx]) {
        with_node(node, exclusive, |n| n.children[idx] = child.clone());
    }
}

/// Same idea as [`take_child`]/[`restore_child`] but for the `collMap`
/// region: avoids inflating the extracted leaf's strong count with an
/// aliasing clone before a possible in-place edit.
fn take_collision<K, V>(node: &mut Rc<BitmapIndexedNode<K, V>>, exclusive: bool, idx: usize) -> (Rc<HashCollisionLeaf<K, V>>, bool)
where
    K: Clone,
    V: Clone,
{
    let leaf_exclusive = exclusive && is_unique(&node.collisions[idx]);
    let leaf = if exclusive {
        let inner = Rc::get_mut(node).expect("exclusive implies unique ownership");
        std::mem::replace(&mut inner.collisions[idx], Rc::new(HashCollisionLeaf { hash: 0, entries: Vec::new() }))
    } else {
        Rc::clone(&node.collisions[idx])
    };
    (leaf, leaf_exclusive)
}

/// Counterpart to [`take_collision`].
fn restore_collision<K, V>(node: &mut Rc<BitmapIndexedNode<K, V>>, exclusive: bool, idx: usize, leaf: Rc<HashCollisionLeaf<K, V>>)
where
    K: Clone,
    V: Clone,
{
    if exclusive {
        let inner = Rc::get_mut(node).expect("exclusive implies unique ownership");
        inner.collisions[idx] = leaf;
    } else if !Rc::ptr_eq(&leaf, &node.collisions[idx]) {
        with_node(node, exclusive, |n| n.collisions[idx] = leaf.clone());
    }
}

/// Builds a fresh chain of bitmap-indexed nodes from `shift` downward,
/// splitting `a` from `b` at the first level their hash fragments diverge.
/// Falls back to a single-slot node wrapping a collision leaf if `shift`
/// runs past the hash width before the fragments diverge — unreachable for
/// two genuinely unequal hashes at a 64-bit width, but kept as the
/// well-defined terminal case the bit math allows for.
fn build_split_chain<K, V>(a: Side<K, V>, b: Side<K, V>, shift: u32) -> Rc<BitmapIndexedNode<K, V>> {
    if shift > MAX_SHIFT {
        let hash = a.hash();
        let mut entries = Vec::with_capacity(4);
        flatten_side(a, &mut entries);
        flatten_side(b, &mut entries);
        let leaf = Rc::new(HashCollisionLeaf::new(hash, entries));
        let mut n = BitmapIndexedNode::default();
        let bit = bits::bitpos(bits::fragment(hash, MAX_SHIFT));
        n.bitmap1 |= bit;
        n.bitmap2 |= bit;
        n.collisions.push(leaf);
        return Rc::new(n);
    }

    let fa = bits::fragment(a.hash(), shift);
    let fb = bits::fragment(b.hash(), shift);

    if fa == fb {
        let bit = bits::bitpos(fa);
        let child = build_split_chain(a, b, shift + BITS_PER_LEVEL);
        let mut n = BitmapIndexedNode::default();
        n.bitmap2 |= bit;
        n.children.push(child);
        Rc::new(n)
    } else {
        let (lo, hi, bit_lo, bit_hi) = if fa < fb {
            (a, b, bits::bitpos(fa), bits::bitpos(fb))
        } else {
            (b, a, bits::bitpos(fb), bits::bitpos(fa))
        };
        let mut n = BitmapIndexedNode::default();
        place_side(&mut n, lo, bit_lo);
        place_side(&mut n, hi, bit_hi);
        Rc::new(n)
    }
}

fn flatten_side<K, V>(side: Side<K, V>, out: &mut Vec<Entry<K, V>>) {
    match side {
        Side::Entry(e) => out.push(e),
        Side::Collision(leaf) => match Rc::try_unwrap(leaf) {
            Ok(l) => out.extend(l.entries),
            Err(rc) => out.extend(rc.entries.iter().cloned()),
        },
    }
}

fn place_side<K, V>(n: &mut BitmapIndexedNode<K, V>, side: Side<K, V>, bit: u32) {
    match side {
        Side::Entry(e) => {
            n.bitmap1 |= bit;
            n.entries.push(e);
        }
        Side::Collision(leaf) => {
            n.bitmap1 |= bit;
            n.bitmap2 |= bit;
            n.collisions.push(leaf);
        }
    }
}

// ---------------------------------------------------------------------------
// Remove
// ---------------------------------------------------------------------------

/// What a recursive [`remove`] call hands back to its caller.
pub(crate) enum RemovedSubtree<K, V> {
    /// The subtree vanished entirely.
    Empty,
    /// Exactly one payload remains under this subtree. The caller either
    /// inlines it at the slot it already knows, or — if this subtree was
    /// itself the parent's only occupant — escalates it unchanged.
    SinglePayload(Entry<K, V>),
    /// Exactly one collision leaf remains and nothing else. Same
    /// escalate-or-inline choice as `SinglePayload`.
    SingleCollision(Rc<HashCollisionLeaf<K, V>>),
    /// An ordinary, already-compacted subtree.
    Node(Rc<BitmapIndexedNode<K, V>>),
}

pub(crate) enum RemoveOutcome<K, V> {
    /// The key was absent. Carries the node back unchanged — a caller that
    /// extracted it via [`take_child`]/[`take_collision`] (or via the
    /// handle's `mem::take` at the root) must restore it rather than let it
    /// drop, or it would silently discard an unrelated, still-live subtree.
    NotFound(Rc<BitmapIndexedNode<K, V>>),
    Removed {
        subtree: RemovedSubtree<K, V>,
        removed_value: V,
    },
}

enum LeafRemoveOutcome<K, V> {
    /// The key was absent. Carries the leaf back unchanged, same reasoning
    /// as [`RemoveOutcome::NotFound`].
    NotFound(Rc<HashCollisionLeaf<K, V>>),
    Shrunk { leaf: Rc<HashCollisionLeaf<K, V>>, removed_value: V },
    /// The bucket is down to one entry; carries the survivor and the value
    /// that was removed.
    Single { survivor: Entry<K, V>, removed_value: V },
}

/// Removes `key` from the subtree rooted at `node`.
pub(crate) fn remove<K, V>(mut node: Rc<BitmapIndexedNode<K, V>>, exclusive: bool, key: &K, hash: u64, shift: u32) -> RemoveOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
{
    let frag = bits::fragment(hash, shift);
    let bit = bits::bitpos(frag);

    if node.data_map() & bit != 0 {
        let pos = node.data_index(bit);
        if node.entries[pos].key != *key {
            return RemoveOutcome::NotFound(node);
        }
        let payload_arity = node.entries.len();
        let node_arity = node.children.len();
        let coll_arity = node.collisions.len();
        let removed_value = node.entries[pos].value.clone();

        if payload_arity == 2 && node_arity == 0 && coll_arity == 0 {
            let survivor = node.entries[1 - pos].clone();
            return RemoveOutcome::Removed {
                subtree: RemovedSubtree::SinglePayload(survivor),
                removed_value,
            };
        }
        if payload_arity == 1 && node_arity == 0 && coll_arity == 1 {
            // Only a collision leaf remains under this node; collapse to a
            // bare single-collision carrier for the caller to inline or
            // escalate (the node -> collision migration).
            let leaf = Rc::clone(&node.collisions[0]);
            return RemoveOutcome::Removed {
                subtree: RemovedSubtree::SingleCollision(leaf),
                removed_value,
            };
        }
        if payload_arity == 1 && node_arity == 0 && coll_arity == 0 {
            return RemoveOutcome::Removed {
                subtree: RemovedSubtree::Empty,
                removed_value,
            };
        }
        with_node(&mut node, exclusive, |n| {
            n.entries.remove(pos);
            n.bitmap1 &= !bit;
        });
        RemoveOutcome::Removed {
            subtree: RemovedSubtree::Node(node),
            removed_value,
        }
    } else if node.node_map() & bit != 0 {
        remove_via_node_child(node, exclusive, key, hash, shift, bit)
    } else if node.coll_map() & bit != 0 {
        remove_via_collision_child(node, exclusive, key, hash, bit)
    } else {
        RemoveOutcome::NotFound(node)
    }
}

fn remove_via_node_child<K, V>(
    mut node: Rc<BitmapIndexedNode<K, V>>,
    exclusive: bool,
    key: &K,
    hash: u64,
    shift: u32,
    bit: u32,
) -> RemoveOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
{
    let idx = node.node_index(bit);
    let (child, child_exclusive) = take_child(&mut node, exclusive, idx);
    let outcome = remove(child, child_exclusive, key, hash, shift + BITS_PER_LEVEL);

    let (child_result, removed_value) = match outcome {
        RemoveOutcome::NotFound(child) => {
            restore_child(&mut node, exclusive, idx, child);
            return RemoveOutcome::NotFound(node);
        }
        RemoveOutcome::Removed { subtree, removed_value } => (subtree, removed_value),
    };

    // Whether this node has any occupant besides the child we just recursed
    // into — decides escalate-unchanged vs. inline-at-this-slot below.
    let is_only_child = node.entries.len() + node.collisions.len() + node.children.len() == 1;

    match child_result {
        RemovedSubtree::Empty => {
            if is_only_child {
                return RemoveOutcome::Removed {
                    subtree: RemovedSubtree::Empty,
                    removed_value,
                };
            }
            with_node(&mut node, exclusive, |n| {
                n.children.remove(idx);
                n.bitmap2 &= !bit;
            });
            RemoveOutcome::Removed {
                subtree: RemovedSubtree::Node(node),
                removed_value,
            }
        }
        RemovedSubtree::SinglePayload(entry) if is_only_child => RemoveOutcome::Removed {
            subtree: RemovedSubtree::SinglePayload(entry),
            removed_value,
        },
        RemovedSubtree::SinglePayload(entry) => {
            with_node(&mut node, exclusive, |n| {
                n.children.remove(idx);
                n.migrate_node_to_inline(bit);
                let data_idx = n.data_index(bit);
                n.entries.insert(data_idx, entry.clone());
            });
            RemoveOutcome::Removed {
                subtree: RemovedSubtree::Node(node),
                removed_value,
            }
        }
        RemovedSubtree::SingleCollision(leaf) if is_only_child => RemoveOutcome::Removed {
            subtree: RemovedSubtree::SingleCollision(leaf),
            removed_value,
        },
        RemovedSubtree::SingleCollision(leaf) => {
            with_node(&mut node, exclusive, |n| {
                n.children.remove(idx);
                n.migrate_node_to_collision(bit);
                let coll_idx = n.coll_index(bit);
                n.collisions.insert(coll_idx, leaf.clone());
            });
            RemoveOutcome::Removed {
                subtree: RemovedSubtree::Node(node),
                removed_value,
            }
        }
        RemovedSubtree::Node(new_child) => {
            restore_child(&mut node, exclusive, idx, new_child);
            RemoveOutcome::Removed {
                subtree: RemovedSubtree::Node(node),
                removed_value,
            }
        }
    }
}

fn remove_via_collision_child<K, V>(mut node: Rc<BitmapIndexedNode<K, V>>, exclusive: bool, key: &K, hash: u64, bit: u32) -> RemoveOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
{
    let idx = node.coll_index(bit);
    if node.collisions[idx].hash != hash {
        return RemoveOutcome::NotFound(node);
    }
    let (leaf, leaf_exclusive) = take_collision(&mut node, exclusive, idx);
    let leaf_outcome = remove_from_leaf(leaf, leaf_exclusive, key);

    let is_only_child = node.entries.len() + node.children.len() + node.collisions.len() == 1;

    match leaf_outcome {
        LeafRemoveOutcome::NotFound(leaf) => {
            restore_collision(&mut node, exclusive, idx, leaf);
            RemoveOutcome::NotFound(node)
        }
        LeafRemoveOutcome::Shrunk { leaf: new_leaf, removed_value } => {
            restore_collision(&mut node, exclusive, idx, new_leaf);
            RemoveOutcome::Removed {
                subtree: RemovedSubtree::Node(node),
                removed_value,
            }
        }
        LeafRemoveOutcome::Single { survivor, removed_value } => {
            if is_only_child {
                RemoveOutcome::Removed {
                    subtree: RemovedSubtree::SinglePayload(survivor),
                    removed_value,
                }
            } else {
                with_node(&mut node, exclusive, |n| {
                    n.collisions.remove(idx);
                    n.migrate_collision_to_inline(bit);
                    let data_idx = n.data_index(bit);
                    n.entries.insert(data_idx, survivor.clone());
                });
                RemoveOutcome::Removed {
                    subtree: RemovedSubtree::Node(node),
                    removed_value,
                }
            }
        }
    }
}

fn remove_from_leaf<K: Eq + Clone, V: Clone>(mut leaf: Rc<HashCollisionLeaf<K, V>>, exclusive: bool, key: &K) -> LeafRemoveOutcome<K, V> {
    let Some(pos) = leaf.entries.iter().position(|e| e.key == *key) else {
        return LeafRemoveOutcome::NotFound(leaf);
    };

    if leaf.entries.len() == 2 {
        let removed_value = leaf.entries[pos].value.clone();
        let survivor = leaf.entries[1 - pos].clone();
        return LeafRemoveOutcome::Single { survivor, removed_value };
    }

    let removed_value = leaf.entries[pos].value.clone();
    with_leaf(&mut leaf, exclusive, |l| {
        l.entries.remove(pos);
    });
    LeafRemoveOutcome::Shrunk { leaf, removed_value }
}
