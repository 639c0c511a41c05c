//! Integration tests for memokit

mod store_tests {
    use memokit::store::{GuidStore, PathRequest, StoreConfig};
    use tempfile::TempDir;

    #[test]
    fn layout_is_stable() {
        let temp = TempDir::new().unwrap();
        let store = GuidStore::new(StoreConfig::new(temp.path()).with_suffix(".txt")).unwrap();

        let path = store.path(None, "abcdef", None).unwrap();
        assert_eq!(path, temp.path().join("common").join("ab").join("abcdef.txt"));
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(store.path(None, "abcdef", None).unwrap(), path);

        let custom = store
            .path_for(&PathRequest::new("abcdef").volume("v").chapter("zz").suffix(".bin"))
            .unwrap();
        assert_eq!(custom, temp.path().join("v").join("zz").join("abcdef.bin"));
    }

    #[tokio::test]
    async fn clear_volume_is_isolated() {
        let temp = TempDir::new().unwrap();
        let store = GuidStore::new(StoreConfig::new(temp.path())).unwrap();
        let cleared = store.path(Some("a"), "guid1", None).unwrap();
        let kept = store.path(Some("b"), "guid2", None).unwrap();
        std::fs::write(&cleared, "x").unwrap();
        std::fs::write(&kept, "y").unwrap();

        let removed = store.clear_volume("a").await.unwrap();

        assert_eq!(removed, 1);
        assert!(!cleared.exists());
        assert!(kept.exists());
    }
}

mod cache_tests {
    use memokit::cache::{CacheOptions, Memo, MemoCache};
    use memokit::MemoError;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> MemoCache {
        MemoCache::new(CacheOptions::at_path(temp.path())).unwrap()
    }

    #[test]
    fn value_survives_new_instance() {
        let temp = TempDir::new().unwrap();
        let value = json!({"answer": 42, "list": [1, 2, 3]});

        open(&temp)
            .put("guid1", Some("vol"), Memo::Ready(value.clone()), json!([1]))
            .unwrap();

        let fresh = open(&temp);
        let memo = fresh.get("guid1", Some("vol")).unwrap().unwrap();
        assert_eq!(memo.as_ready(), Some(&value));
        assert_eq!(fresh.file_reads(), 1);

        let text = std::fs::read_to_string(fresh.entry_path("guid1", Some("vol")).unwrap()).unwrap();
        let stored: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(stored["isPromise"], json!(false));
        assert_eq!(stored["volume"], json!("vol"));
        assert_eq!(stored["args"], json!([1]));
    }

    #[tokio::test]
    async fn deferred_value_persists_once_settled() {
        let temp = TempDir::new().unwrap();
        let cache = open(&temp);
        let (tx, rx) = tokio::sync::oneshot::channel::<Value>();

        let pending = Memo::deferred(async move {
            rx.await
                .map_err(|e| MemoError::Computation(Box::new(e)))
        });
        let stored = cache.put("guid2", None, pending, Value::Null).unwrap();
        let path = cache.entry_path("guid2", None).unwrap();
        assert!(!path.exists());

        tx.send(json!("done")).unwrap();
        assert_eq!(stored.resolve().await.unwrap(), json!("done"));
        assert!(path.exists());

        let reread = open(&temp).get("guid2", None).unwrap().unwrap();
        assert!(reread.is_deferred());
        assert_eq!(reread.resolve().await.unwrap(), json!("done"));
    }

    #[test]
    fn corrupt_file_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let cache = open(&temp);
        let path = cache.entry_path("guid3", None).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        assert!(cache.get("guid3", None).unwrap().is_none());
    }
}

mod memoizer_tests {
    use memokit::cache::CacheOptions;
    use memokit::{Computation, Memoizer, MemoizerOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn memoizer(temp: &TempDir) -> Memoizer {
        Memoizer::new(MemoizerOptions {
            cache_options: CacheOptions::at_path(temp.path()),
            ..MemoizerOptions::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn results_outlive_the_process_cache() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = Arc::clone(&calls);
            let memo = memoizer(&temp);
            let square = memo.memoize_async(
                Computation::new("square", "1"),
                Some(&"tests"),
                move |n: u64| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, std::io::Error>(n * n)
                    }
                },
            );
            assert_eq!(square.volume(), "tests.square");
            assert_eq!(square.call(12).await.unwrap(), 144);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_memo_forces_recompute() {
        let temp = TempDir::new().unwrap();
        let memo = memoizer(&temp);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let computation = Computation::new("echo", "1");

        let echo = memo.memoize(computation.clone(), None, move |s: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            s
        });

        echo.call("hi".to_string()).unwrap();
        echo.call("hi".to_string()).unwrap();
        memo.clear_memo(&computation, None).await.unwrap();
        echo.call("hi".to_string()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

mod prune_tests {
    use memokit::cache::{CacheOptions, Memo, MemoCache};
    use memokit::config::{ConfigLoader, MemoConfig};
    use memokit::{FilePruner, MemoError};
    use serde_json::json;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn age(path: &std::path::Path, days: u64) {
        let mtime = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[tokio::test]
    async fn config_driven_sweep_spares_touched_entries() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        let store_root = temp.path().join("store");
        std::fs::write(
            &config_path,
            format!(
                "[store]\npath = {:?}\n\n[pruner]\nprune_days = 30\n",
                store_root.display().to_string()
            ),
        )
        .unwrap();

        let config: MemoConfig = ConfigLoader::with_path(config_path).load().await.unwrap();
        let cache = MemoCache::new(config.cache_options().unwrap()).unwrap();
        cache.put("stale", None, Memo::Ready(json!(1)), json!(null)).unwrap();
        cache.put("used", None, Memo::Ready(json!(2)), json!(null)).unwrap();
        let stale = cache.entry_path("stale", None).unwrap();
        let used = cache.entry_path("used", None).unwrap();
        age(&stale, 60);
        age(&used, 60);

        // A memory hit refreshes the file
        cache.get("used", None).unwrap().unwrap();

        let pruner = FilePruner::new(config.pruner_options()).unwrap();
        let report = pruner.prune_old_files().await.unwrap();

        assert_eq!(report.files_pruned, 1);
        assert!(!stale.exists());
        assert!(used.exists());

        // Still served from memory after its file is gone
        assert!(cache.get("stale", None).unwrap().is_some());
        let reopened = MemoCache::new(CacheOptions::at_path(&store_root)).unwrap();
        assert!(reopened.get("stale", None).unwrap().is_none());
    }

    #[test]
    fn missing_root_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut config = MemoConfig::default();
        config.pruner.root = Some(temp.path().join("absent"));

        let err = FilePruner::new(config.pruner_options()).err().unwrap();
        assert!(matches!(err, MemoError::PrunerRoot(_)));
        assert!(err.hint().is_some());
    }
}
