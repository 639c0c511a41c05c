//! Cache entry format and pluggable codecs

use crate::error::MemoResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cache entry as persisted on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Whether the value was produced by an asynchronous computation
    #[serde(rename = "isPromise")]
    pub is_promise: bool,

    /// Volume the entry belongs to
    pub volume: String,

    /// Arguments the value was computed from
    #[serde(default)]
    pub args: Value,

    /// The resolved value
    pub value: Value,
}

/// Converts cache entries to and from their file representation
pub trait Codec: Send + Sync {
    /// Encode an entry for writing
    fn serialize(&self, entry: &CacheEntry) -> MemoResult<String>;

    /// Decode an entry read from disk
    fn deserialize(&self, text: &str) -> MemoResult<CacheEntry>;
}

/// Pretty-printed JSON, the default on-disk format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn serialize(&self, entry: &CacheEntry) -> MemoResult<String> {
        Ok(serde_json::to_string_pretty(entry)?)
    }

    fn deserialize(&self, text: &str) -> MemoResult<CacheEntry> {
        Ok(serde_json::from_str(text)?)
    }
}
