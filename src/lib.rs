//! memokit - filesystem-backed memoization
//!
//! Caches the results of deterministic computations in memory and in a
//! sharded on-disk store, so later calls (and later processes) reuse them.
//!
//! - [`store`]: maps `(volume, guid)` to a file path
//! - [`cache`]: two-tier memory and file cache with deferred values
//! - [`memoizer`]: wraps sync and async functions over the cache
//! - [`prune`]: deletes files that have not been touched for a while

pub mod cache;
pub mod config;
pub mod error;
pub mod files;
pub mod logging;
pub mod memoizer;
pub mod prune;
pub mod store;

pub use cache::{CacheOptions, Flag, Memo, MemoCache};
pub use config::{ConfigLoader, MemoConfig};
pub use error::{MemoError, MemoResult};
pub use memoizer::{Computation, MemoContext, Memoizer, MemoizerOptions};
pub use prune::{FilePruner, PruneFilter, PruneReport, PrunerOptions};
pub use store::{GuidStore, StoreConfig};
