//! The ownership probe: "is this child uniquely owned by me?"
//!
//! A side-effect-free read of a reference's share count. `true` is a
//! promise the caller may mutate in place; a false negative (reporting
//! shared when actually unique) only costs an extra clone, but a false
//! positive would corrupt a sibling logical map, so this must be probed
//! fresh at every recursion frame rather than cached or inherited.

use std::rc::Rc;

/// Returns `true` if `rc` is the only outstanding reference to its target.
#[inline]
#[must_use]
pub fn is_unique<T>(rc: &Rc<T>) -> bool {
    Rc::strong_count(rc) == 1
}
