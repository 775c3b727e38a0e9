//! Key/value hashing helper shared by every operation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Computes the 64-bit hash of a value using the standard hasher.
///
/// A single fixed hasher is used for every instance (no per-instance seed or
/// custom hasher injection point) — keys compare routable only against
/// themselves within one process run.
#[must_use]
pub fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
