//! Per-call effect channel recording whether an update/remove changed
//! anything and what value, if any, it displaced.

/// Out-parameter threaded through a recursive `update`/`remove` call.
///
/// Both flags start unset; a mutating branch sets them on its way back up.
pub struct Effect<V> {
    /// Set once the structure (or a stored value) actually changed.
    pub modified: bool,
    /// The value that occupied the slot before this call, if any.
    pub replaced_value: Option<V>,
}

impl<V> Effect<V> {
    /// Creates a fresh, unset effect channel.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modified: false,
            replaced_value: None,
        }
    }
}

impl<V> Default for Effect<V> {
    fn default() -> Self {
        Self::new()
    }
}
