//! Bit math for trie-level hash-fragment indexing.

/// Bits consumed per trie level (5 → 32-way branching).
pub const BITS_PER_LEVEL: u32 = 5;

/// Fan-out per node: `2^BITS_PER_LEVEL`.
pub const FANOUT: u32 = 1 << BITS_PER_LEVEL;

/// Hash width in bits.
pub const HASH_BITS: u32 = 64;

/// Last valid inner-node shift. Beyond this, a further fragment cannot be
/// extracted from a 64-bit hash, so a split chain must terminate in a
/// collision leaf instead.
pub const MAX_SHIFT: u32 = (HASH_BITS / BITS_PER_LEVEL) * BITS_PER_LEVEL;

/// Extracts the 5-bit hash fragment at the given bit-shift depth.
#[inline]
#[must_use]
pub const fn fragment(hash: u64, shift: u32) -> u32 {
    ((hash >> shift) & (FANOUT as u64 - 1)) as u32
}

/// Returns the one-hot bit mask for the given fragment (0..31).
#[inline]
#[must_use]
pub const fn bitpos(frag: u32) -> u32 {
    1 << frag
}

/// Returns the compact index of `bit` within `bitmap`: the number of set
/// bits in `bitmap` below `bit`'s position.
#[inline]
#[must_use]
pub const fn popcount_below(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}
