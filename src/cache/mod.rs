//! Two-tier memoization cache
//!
//! Values are held in memory and mirrored to files in a content-addressed
//! [`GuidStore`](crate::store::GuidStore):
//!
//! ```text
//! {store_root}/{volume}/{chapter}/{guid}.json
//! ```
//!
//! # Value States
//!
//! | Memo | Memory | File |
//! |------|--------|------|
//! | Ready | stored at `put` | written at `put` |
//! | Deferred, pending | stored at `put` | not yet written |
//! | Deferred, settled | unchanged | written with `isPromise: true` |
//! | Deferred, failed | evicted | never written |
//!
//! Which tiers are used is controlled per call by [`Flag`]s, so behavior can
//! be switched at runtime without rebuilding the cache.

pub mod codec;
pub mod flag;
pub mod memo;
pub mod memo_cache;

pub use codec::{CacheEntry, Codec, JsonCodec};
pub use flag::Flag;
pub use memo::{DeferredValue, Memo};
pub use memo_cache::{CacheOptions, MemoCache, DEFAULT_STORE_NAME, DEFAULT_SUFFIX};
