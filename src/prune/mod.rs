//! Age-based pruning of cache directories
//!
//! A [`FilePruner`] walks a directory tree and deletes files whose
//! modification time is at least `prune_days` old. Cache reads refresh
//! modification times, so entries that are still in use survive.

pub mod pruner;
pub mod report;

pub use pruner::{AlwaysPrune, FilePruner, PruneFilter, PrunerOptions, DEFAULT_PRUNE_DAYS};
pub use report::{format_bytes, PruneReport};
