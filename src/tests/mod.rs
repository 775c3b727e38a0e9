mod basic;
mod compaction;
mod random_ops;
mod traits;
