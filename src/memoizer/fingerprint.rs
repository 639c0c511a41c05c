//! Deterministic cache keys

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Hash of `{volume, fbody, args}` used as a memoization guid
///
/// The key is hashed through its canonical JSON text. Object keys are
/// emitted in sorted order, so equal inputs hash identically regardless of
/// how their maps were built, and the result is stable across runs.
pub fn fingerprint(volume: &str, identity: &str, args: &Value) -> String {
    let key = json!({
        "volume": volume,
        "fbody": identity,
        "args": args,
    });
    let canonical = canonicalize(&key).to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Rebuild `value` with every object's keys in sorted order
///
/// Only changes anything when serde_json's `preserve_order` feature is
/// enabled somewhere in the build; the default `Map` is already sorted.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<_> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                fields
                    .into_iter()
                    .map(|(key, field)| (key.clone(), canonicalize(field)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
