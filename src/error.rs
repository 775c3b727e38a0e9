//! Error types surfaced across the handle's API.
//!
//! Point operations (`get`, `insert`, `remove`) never fail — a missing key
//! is represented as `None` on the return channel, not as an error. The
//! only fallible entry point is bulk construction from a sequence that may
//! contain a repeated key.

use std::fmt;

/// Returned by [`HamtMap::from_unique_iter`](crate::HamtMap::from_unique_iter)
/// when the input sequence repeats a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKeyError;

impl fmt::Display for DuplicateKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate key in bulk construction")
    }
}

impl std::error::Error for DuplicateKeyError {}
