//! Two-tier (memory + file) cache

use crate::cache::codec::{CacheEntry, Codec, JsonCodec};
use crate::cache::flag::Flag;
use crate::cache::memo::{DeferredValue, Memo};
use crate::error::{MemoError, MemoResult};
use crate::files::FileWalker;
use crate::store::{GuidStore, StoreConfig};
use futures_util::future::{BoxFuture, FutureExt, WeakShared};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, FileTimes};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

/// Default suffix of cache files
pub const DEFAULT_SUFFIX: &str = ".json";

/// Default store name when the cache opens its own store
pub const DEFAULT_STORE_NAME: &str = "memo";

type VolumeMap = HashMap<String, HashMap<String, Memo>>;

type WeakDeferred = WeakShared<BoxFuture<'static, Result<Value, Arc<MemoError>>>>;

/// Options for building a [`MemoCache`]
#[derive(Clone)]
pub struct CacheOptions {
    /// Existing store to use; when unset a store is opened from
    /// `store_path` or `store_name`
    pub store: Option<Arc<GuidStore>>,

    /// Name of the store below the platform cache directory
    pub store_name: String,

    /// Explicit store location, overriding `store_name`
    pub store_path: Option<PathBuf>,

    /// File format of cache entries
    pub codec: Arc<dyn Codec>,

    /// Keep values in memory
    pub write_mem: Flag,

    /// Persist values to files
    pub write_file: Flag,

    /// Read values from files; follows `write_file` when unset
    pub read_file: Option<Flag>,

    /// Suffix of cache files
    pub suffix: String,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            store: None,
            store_name: DEFAULT_STORE_NAME.to_string(),
            store_path: None,
            codec: Arc::new(JsonCodec),
            write_mem: Flag::constant(true),
            write_file: Flag::constant(true),
            read_file: None,
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl CacheOptions {
    /// Options for a cache over an existing store
    pub fn with_store(store: Arc<GuidStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Options for a cache rooted at `path`
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: Some(path.into()),
            ..Self::default()
        }
    }
}

struct CacheInner {
    map: Mutex<VolumeMap>,
    store: Arc<GuidStore>,
    codec: Arc<dyn Codec>,
    write_mem: Flag,
    write_file: Flag,
    read_file: Flag,
    suffix: String,
    file_reads: AtomicU64,
    file_writes: AtomicU64,
}

impl CacheInner {
    fn map(&self) -> MutexGuard<'_, VolumeMap> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop a failed value from memory unless it was already replaced
    fn evict_deferred(&self, volume: &str, guid: &str, failed: &DeferredValue) {
        let mut map = self.map();
        if let Some(entries) = map.get_mut(volume) {
            if entries.get(guid).is_some_and(|memo| memo.shares_computation(failed)) {
                entries.remove(guid);
            }
        }
    }
}

/// Two-tier cache keyed by `(volume, guid)`
///
/// Values live in an in-memory map and are mirrored to files in a
/// [`GuidStore`]. Cloning is cheap; clones share state.
///
/// The file pruner deletes files without informing this cache, so an entry
/// may stay in memory after its backing file is gone. It is rewritten on the
/// next `put` of the same key.
#[derive(Clone)]
pub struct MemoCache {
    inner: Arc<CacheInner>,
}

impl MemoCache {
    /// Build a cache, opening a store if none is supplied
    pub fn new(options: CacheOptions) -> MemoResult<Self> {
        let store = match options.store {
            Some(store) => store,
            None => {
                let config = match options.store_path {
                    Some(path) => StoreConfig::new(path),
                    None => StoreConfig::named(&options.store_name),
                };
                Arc::new(GuidStore::new(config)?)
            }
        };

        let read_file = options
            .read_file
            .unwrap_or_else(|| options.write_file.clone());

        Ok(Self {
            inner: Arc::new(CacheInner {
                map: Mutex::new(HashMap::new()),
                store,
                codec: options.codec,
                write_mem: options.write_mem,
                write_file: options.write_file,
                read_file,
                suffix: options.suffix,
                file_reads: AtomicU64::new(0),
                file_writes: AtomicU64::new(0),
            }),
        })
    }

    /// Backing store
    pub fn store(&self) -> &Arc<GuidStore> {
        &self.inner.store
    }

    /// Number of cache files read by this instance
    pub fn file_reads(&self) -> u64 {
        self.inner.file_reads.load(Ordering::Relaxed)
    }

    /// Number of cache files written by this instance
    pub fn file_writes(&self) -> u64 {
        self.inner.file_writes.load(Ordering::Relaxed)
    }

    /// Path of the file backing `(volume, guid)`
    pub fn entry_path(&self, guid: &str, volume: Option<&str>) -> MemoResult<PathBuf> {
        let volume = volume.unwrap_or(self.inner.store.default_volume());
        self.inner
            .store
            .path(Some(volume), guid, Some(&self.inner.suffix))
    }

    /// Whether `(volume, guid)` is currently held in memory
    pub fn in_memory(&self, guid: &str, volume: Option<&str>) -> bool {
        let volume = volume.unwrap_or(self.inner.store.default_volume());
        self.inner
            .map()
            .get(volume)
            .is_some_and(|entries| entries.contains_key(guid))
    }

    /// Look up a value
    ///
    /// A memory hit refreshes the backing file's modification time, keeping
    /// it clear of the pruner. A file that cannot be read or decoded is
    /// logged and reported as a miss.
    pub fn get(&self, guid: &str, volume: Option<&str>) -> MemoResult<Option<Memo>> {
        let inner = &self.inner;
        let volume = volume.unwrap_or(inner.store.default_volume());
        let cached = inner
            .map()
            .get(volume)
            .and_then(|entries| entries.get(guid).cloned());
        let path = self.entry_path(guid, Some(volume))?;

        if let Some(memo) = cached {
            if inner.write_file.is_set() && path.exists() {
                if let Err(e) = touch(&path) {
                    warn!("Failed to touch {}: {}", path.display(), e);
                }
            }
            debug!("Memory hit {}/{}", volume, guid);
            return Ok(Some(memo));
        }

        if !inner.read_file.is_set() || !path.exists() {
            return Ok(None);
        }

        let entry = match self.read_entry(&path) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("get({}, {}) treated as miss: {}", volume, guid, e);
                return Ok(None);
            }
        };

        let memo = if entry.is_promise {
            Memo::resolved(entry.value)
        } else {
            Memo::Ready(entry.value)
        };

        if inner.write_mem.is_set() {
            inner
                .map()
                .entry(volume.to_string())
                .or_default()
                .insert(guid.to_string(), memo.clone());
        }

        debug!("File hit {}/{}", volume, guid);
        Ok(Some(memo))
    }

    fn read_entry(&self, path: &Path) -> MemoResult<CacheEntry> {
        let text = fs::read_to_string(path)
            .map_err(|e| MemoError::io(format!("reading cache file {}", path.display()), e))?;
        self.inner.file_reads.fetch_add(1, Ordering::Relaxed);
        self.inner.codec.deserialize(&text)
    }

    /// Store a value
    ///
    /// The memory entry is assigned before any I/O, so concurrent lookups of
    /// the same key see the value (possibly still computing) at once.
    ///
    /// A ready value is written to its file before returning. A deferred
    /// value is replaced by a new deferred value that settles only after the
    /// result has been written. That value is what memory holds and what is
    /// returned, so awaiting either guarantees the file exists. Inside a tokio
    /// runtime it is also driven by a background task, so the file is written
    /// even if nobody awaits it. If the computation fails nothing is written,
    /// the entry is dropped from memory, and the error reaches every waiter.
    pub fn put(&self, guid: &str, volume: Option<&str>, memo: Memo, args: Value) -> MemoResult<Memo> {
        let inner = &self.inner;
        let volume = volume.unwrap_or(inner.store.default_volume()).to_string();

        if !inner.write_file.is_set() {
            self.remember(&volume, guid, &memo);
            self.entry_path(guid, Some(&volume))?;
            return Ok(memo);
        }

        match memo {
            Memo::Ready(value) => {
                self.remember(&volume, guid, &Memo::Ready(value.clone()));
                let path = self.entry_path(guid, Some(&volume))?;
                let entry = CacheEntry {
                    is_promise: false,
                    volume,
                    args,
                    value,
                };
                let text = inner.codec.serialize(&entry)?;
                fs::write(&path, &text)
                    .map_err(|e| MemoError::io(format!("writing cache file {}", path.display()), e))?;
                inner.file_writes.fetch_add(1, Ordering::Relaxed);
                info!(
                    "put({},{}) sync args:{} bytes:{}",
                    entry.volume,
                    guid,
                    entry.args,
                    text.len()
                );
                Ok(Memo::Ready(entry.value))
            }
            Memo::Deferred(pending) => {
                let path = self.entry_path(guid, Some(&volume))?;
                let persisted = self.persist_deferred(volume.clone(), guid.to_string(), path, args, pending);
                self.remember(&volume, guid, &Memo::Deferred(persisted.clone()));

                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    runtime.spawn(persisted.clone().map(drop));
                }
                Ok(Memo::Deferred(persisted))
            }
        }
    }

    fn remember(&self, volume: &str, guid: &str, memo: &Memo) {
        if self.inner.write_mem.is_set() {
            self.inner
                .map()
                .entry(volume.to_string())
                .or_default()
                .insert(guid.to_string(), memo.clone());
        }
    }

    /// Wrap `pending` so that settling it writes the cache file
    fn persist_deferred(
        &self,
        volume: String,
        guid: String,
        path: PathBuf,
        args: Value,
        pending: DeferredValue,
    ) -> DeferredValue {
        let inner = Arc::clone(&self.inner);
        let own: Arc<OnceLock<WeakDeferred>> = Arc::new(OnceLock::new());
        let slot = Arc::clone(&own);

        let persisted = async move {
            let value = match pending.await {
                Ok(value) => value,
                Err(e) => {
                    warn!("put({},{}) not persisted: {}", volume, guid, e);
                    if let Some(this) = slot.get().and_then(WeakShared::upgrade) {
                        inner.evict_deferred(&volume, &guid, &this);
                    }
                    return Err(MemoError::Shared(e));
                }
            };

            let entry = CacheEntry {
                is_promise: true,
                volume,
                args,
                value,
            };
            let text = inner.codec.serialize(&entry)?;
            tokio::fs::write(&path, &text).await.map_err(|e| {
                MemoError::io(format!("writing cache file {}", path.display()), e)
            })?;
            inner.file_writes.fetch_add(1, Ordering::Relaxed);
            info!(
                "put({},{}) async args:{} bytes:{}",
                entry.volume,
                guid,
                entry.args,
                text.len()
            );
            Ok(entry.value)
        }
        .map(|result: MemoResult<Value>| result.map_err(Arc::new))
        .boxed()
        .shared();

        if let Some(weak) = persisted.downgrade() {
            let _ = own.set(weak);
        }
        persisted
    }

    /// Names of known volumes
    ///
    /// Memory volumes when memory caching is on, otherwise the volume
    /// directories of the store.
    pub fn volumes(&self) -> MemoResult<Vec<String>> {
        let inner = &self.inner;
        let mut volumes = if inner.write_mem.is_set() {
            inner.map().keys().cloned().collect()
        } else if inner.write_file.is_set() {
            let root = inner.store.root();
            let entries = fs::read_dir(root)
                .map_err(|e| MemoError::io(format!("reading store root {}", root.display()), e))?;
            let mut names = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| MemoError::io("reading store root entry", e))?;
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names
        } else {
            Vec::new()
        };
        volumes.sort();
        Ok(volumes)
    }

    /// Forget every entry of `volume`, in memory and on disk
    pub async fn clear_volume(&self, volume: Option<&str>) -> MemoResult<usize> {
        let volume = volume.unwrap_or(self.inner.store.default_volume());
        info!("Clearing volume {}", volume);
        self.inner.map().remove(volume);

        self.inner.store.clear_volume(volume).await.map_err(|e| {
            error!("Failed to clear volume {}: {}", volume, e);
            e
        })
    }

    /// Total size in bytes of every file in the store
    pub async fn file_size(&self) -> MemoResult<u64> {
        let mut walker = FileWalker::new(self.inner.store.root());
        let mut bytes = 0;
        loop {
            match walker.next().await {
                Ok(Some(entry)) => bytes += entry.size(),
                Ok(None) => return Ok(bytes),
                Err(e) => {
                    error!("Failed to size store {}: {}", self.inner.store.root().display(), e);
                    return Err(e);
                }
            }
        }
    }
}

/// Set a file's access and modification times to now
fn touch(path: &Path) -> std::io::Result<()> {
    let now = SystemTime::now();
    fs::File::options()
        .write(true)
        .open(path)?
        .set_times(FileTimes::new().set_accessed(now).set_modified(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_cache(options: CacheOptions) -> (MemoCache, TempDir) {
        let temp = TempDir::new().unwrap();
        let cache = MemoCache::new(CacheOptions {
            store_path: Some(temp.path().join("memo")),
            ..options
        })
        .unwrap();
        (cache, temp)
    }

    fn reopen(cache: &MemoCache) -> MemoCache {
        MemoCache::new(CacheOptions::with_store(Arc::clone(cache.store()))).unwrap()
    }

    #[test]
    fn default_options() {
        let options = CacheOptions::default();
        assert!(options.write_mem.is_set());
        assert!(options.write_file.is_set());
        assert!(options.read_file.is_none());
        assert_eq!(options.suffix, ".json");
        assert_eq!(options.store_name, "memo");
    }

    #[test]
    fn read_file_follows_write_file() {
        let (cache, _temp) = test_cache(CacheOptions {
            write_file: Flag::constant(false),
            ..CacheOptions::default()
        });
        assert!(!cache.inner.read_file.is_set());
    }

    #[test]
    fn put_adds_memory_entry() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        let res = cache
            .put("guid1", Some("volume1"), json!("value1").into(), Value::Null)
            .unwrap();

        assert_eq!(res.as_ready(), Some(&json!("value1")));
        assert!(cache.in_memory("guid1", Some("volume1")));
        assert_eq!(cache.file_writes(), 1);
    }

    #[test]
    fn get_returns_put_value() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        let value = json!({"text": "value2", "n": [1, 2]});
        cache
            .put("guid2", Some("volume2"), value.clone().into(), Value::Null)
            .unwrap();

        let memo = cache.get("guid2", Some("volume2")).unwrap().unwrap();
        assert_eq!(memo.as_ready(), Some(&value));
    }

    #[test]
    fn new_instance_reads_file() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        cache
            .put("guid3", Some("volume3"), json!("value3").into(), json!(["a"]))
            .unwrap();

        let fresh = reopen(&cache);
        let memo = fresh.get("guid3", Some("volume3")).unwrap().unwrap();
        assert_eq!(memo.as_ready(), Some(&json!("value3")));
        assert_eq!(fresh.file_reads(), 1);
        assert!(fresh.in_memory("guid3", Some("volume3")));
    }

    #[test]
    fn write_mem_off_uses_files_only() {
        let (cache, _temp) = test_cache(CacheOptions {
            write_mem: Flag::constant(false),
            ..CacheOptions::default()
        });
        cache
            .put("guid1", Some("volume1"), json!("value1").into(), Value::Null)
            .unwrap();

        assert!(!cache.in_memory("guid1", Some("volume1")));
        let memo = cache.get("guid1", Some("volume1")).unwrap().unwrap();
        assert_eq!(memo.as_ready(), Some(&json!("value1")));
        assert!(!cache.in_memory("guid1", Some("volume1")));
    }

    #[test]
    fn write_file_off_uses_memory_only() {
        let (cache, _temp) = test_cache(CacheOptions {
            write_file: Flag::constant(false),
            ..CacheOptions::default()
        });
        cache
            .put("guid8", Some("volume8"), json!("value8").into(), Value::Null)
            .unwrap();

        let path = cache.entry_path("guid8", Some("volume8")).unwrap();
        assert!(!path.exists());
        assert_eq!(cache.file_writes(), 0);
        assert!(cache.get("guid8", Some("volume8")).unwrap().is_some());
        assert!(reopen(&cache).get("guid8", Some("volume8")).unwrap().is_none());
    }

    #[test]
    fn dynamic_flags_are_checked_per_call() {
        use std::sync::atomic::AtomicBool;

        let writing = Arc::new(AtomicBool::new(false));
        let observed = Arc::clone(&writing);
        let (cache, _temp) = test_cache(CacheOptions {
            write_file: Flag::dynamic(move || observed.load(Ordering::SeqCst)),
            ..CacheOptions::default()
        });

        cache.put("g1", Some("v"), json!(1).into(), Value::Null).unwrap();
        assert_eq!(cache.file_writes(), 0);

        writing.store(true, Ordering::SeqCst);
        cache.put("g2", Some("v"), json!(2).into(), Value::Null).unwrap();
        assert_eq!(cache.file_writes(), 1);
    }

    #[test]
    fn missing_entry_is_none() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        assert!(cache.get("nothing", Some("nowhere")).unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_a_miss() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        let path = cache.entry_path("broken", Some("volume9")).unwrap();
        fs::write(&path, "{\"isPromise\": fal").unwrap();

        assert!(cache.get("broken", Some("volume9")).unwrap().is_none());
    }

    #[test]
    fn get_touches_backing_file() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        cache
            .put("guid7", Some("volume7"), json!("value7").into(), Value::Null)
            .unwrap();

        let path = cache.entry_path("guid7", Some("volume7")).unwrap();
        let old = SystemTime::now() - Duration::from_secs(3600 * 24 * 365);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();

        cache.get("guid7", Some("volume7")).unwrap().unwrap();

        let mtime = fs::metadata(&path).unwrap().modified().unwrap();
        assert!(mtime > old + Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn deferred_put_writes_after_settling() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        let path = cache.entry_path("guid4", Some("volume4")).unwrap();
        let value = Memo::deferred(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(json!("value4"))
        });

        let pending = cache
            .put("guid4", Some("volume4"), value.clone(), Value::Null)
            .unwrap();
        assert!(!path.exists());

        let settled = pending.resolve().await.unwrap();
        assert!(path.exists());
        assert_eq!(settled, value.resolve().await.unwrap());
        assert_eq!(cache.file_writes(), 1);

        let fresh = reopen(&cache);
        let memo = fresh.get("guid4", Some("volume4")).unwrap().unwrap();
        assert!(memo.is_deferred());
        assert_eq!(memo.resolve().await.unwrap(), json!("value4"));
        assert!(fresh.in_memory("guid4", Some("volume4")));
    }

    #[tokio::test]
    async fn failed_deferred_put_is_not_persisted() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        let path = cache.entry_path("guid10", Some("volume10")).unwrap();
        let value = Memo::deferred(async { Err(MemoError::Codec("upstream".into())) });

        let pending = cache
            .put("guid10", Some("volume10"), value, Value::Null)
            .unwrap();
        assert!(pending.resolve().await.is_err());

        assert!(!path.exists());
        assert!(!cache.in_memory("guid10", Some("volume10")));
        assert_eq!(cache.file_writes(), 0);
    }

    async fn eventually(condition: impl Fn() -> bool) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    #[tokio::test]
    async fn memory_entry_persists_when_put_result_is_dropped() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        let path = cache.entry_path("guid11", Some("volume11")).unwrap();
        let value = Memo::deferred(async { Ok(json!("value11")) });
        drop(cache.put("guid11", Some("volume11"), value, Value::Null).unwrap());

        let memo = cache.get("guid11", Some("volume11")).unwrap().unwrap();
        assert_eq!(memo.resolve().await.unwrap(), json!("value11"));
        assert!(path.exists());
        assert_eq!(cache.file_writes(), 1);
    }

    #[tokio::test]
    async fn unawaited_deferred_put_still_persists() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        let path = cache.entry_path("guid12", Some("volume12")).unwrap();
        let value = Memo::deferred(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(json!("value12"))
        });
        drop(cache.put("guid12", Some("volume12"), value, Value::Null).unwrap());

        assert!(eventually(|| path.exists()).await);
        let fresh = reopen(&cache);
        let memo = fresh.get("guid12", Some("volume12")).unwrap().unwrap();
        assert_eq!(memo.resolve().await.unwrap(), json!("value12"));
    }

    #[tokio::test]
    async fn unawaited_failed_put_is_evicted() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        let path = cache.entry_path("guid13", Some("volume13")).unwrap();
        let value = Memo::deferred(async { Err(MemoError::Codec("upstream".into())) });
        drop(cache.put("guid13", Some("volume13"), value, Value::Null).unwrap());

        assert!(eventually(|| !cache.in_memory("guid13", Some("volume13"))).await);
        assert!(!path.exists());
        assert_eq!(cache.file_writes(), 0);
    }

    #[test]
    fn unreadable_file_is_a_miss() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        let path = cache.entry_path("guid14", Some("volume14")).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(cache.get("guid14", Some("volume14")).unwrap().is_none());
        assert_eq!(cache.file_reads(), 0);
        assert!(!cache.in_memory("guid14", Some("volume14")));
    }

    #[test]
    fn memory_hit_without_file_writes_skips_touch() {
        let (cache, _temp) = test_cache(CacheOptions {
            write_file: Flag::constant(false),
            ..CacheOptions::default()
        });
        cache
            .put("guid15", Some("volume15"), json!("value15").into(), Value::Null)
            .unwrap();

        let path = cache.entry_path("guid15", Some("volume15")).unwrap();
        let old = SystemTime::now() - Duration::from_secs(3600 * 24 * 365);
        fs::write(&path, "stale").unwrap();
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let memo = cache.get("guid15", Some("volume15")).unwrap().unwrap();
        assert_eq!(memo.as_ready(), Some(&json!("value15")));
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();
        assert!(mtime < old + Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn clear_volume_leaves_other_volumes() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        cache
            .put("guid5", Some("volume5"), json!("value5").into(), Value::Null)
            .unwrap();
        cache
            .put("guid6", Some("volume6"), json!("value6").into(), Value::Null)
            .unwrap();
        let path = cache.entry_path("guid5", Some("volume5")).unwrap();
        assert!(path.exists());

        let removed = cache.clear_volume(Some("volume5")).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!path.exists());
        assert!(!cache.in_memory("guid5", Some("volume5")));
        let kept = cache.get("guid6", Some("volume6")).unwrap().unwrap();
        assert_eq!(kept.as_ready(), Some(&json!("value6")));
    }

    #[test]
    fn volumes_from_memory_or_disk() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        cache.put("a", Some("beta"), json!(1).into(), Value::Null).unwrap();
        cache.put("b", Some("alpha"), json!(2).into(), Value::Null).unwrap();
        assert_eq!(cache.volumes().unwrap(), vec!["alpha", "beta"]);

        let disk_only = MemoCache::new(CacheOptions {
            write_mem: Flag::constant(false),
            ..CacheOptions::with_store(Arc::clone(cache.store()))
        })
        .unwrap();
        assert_eq!(disk_only.volumes().unwrap(), vec!["alpha", "beta"]);

        let neither = MemoCache::new(CacheOptions {
            write_mem: Flag::constant(false),
            write_file: Flag::constant(false),
            ..CacheOptions::with_store(Arc::clone(cache.store()))
        })
        .unwrap();
        assert!(neither.volumes().unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_size_sums_store() {
        let (cache, _temp) = test_cache(CacheOptions::default());
        assert_eq!(cache.file_size().await.unwrap(), 0);

        cache.put("a", Some("v"), json!("x").into(), Value::Null).unwrap();
        let path = cache.entry_path("a", Some("v")).unwrap();
        let expected = fs::metadata(path).unwrap().len();

        assert_eq!(cache.file_size().await.unwrap(), expected);
    }
}
