//! Recursive trie operations, one module per verb.

pub mod get;
pub mod remove;
pub mod update;
