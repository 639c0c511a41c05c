//! Sharded content-addressed store
//!
//! Maps a `(volume, guid)` pair to a file path below the store root:
//!
//! ```text
//! {store_root}/{volume}/{chapter}/{guid}{suffix}
//! ```
//!
//! The chapter is the first `folder_prefix` characters of the guid and only
//! exists to bound directory fan-out. The layout is shared with the pruner and
//! may be read directly by other tooling, so it must not change.

use crate::error::{MemoError, MemoResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default number of guid characters used as the chapter directory
pub const DEFAULT_FOLDER_PREFIX: usize = 2;

/// Default volume when a request names none
pub const DEFAULT_VOLUME: &str = "common";

/// Store configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory of the store (created if missing)
    pub store_root: PathBuf,

    /// Number of leading guid characters used as the chapter
    pub folder_prefix: usize,

    /// Volume used when a request names none
    pub default_volume: String,

    /// Suffix used when a request names none
    pub default_suffix: String,
}

impl StoreConfig {
    /// Configuration rooted at an explicit directory
    pub fn new(store_root: impl Into<PathBuf>) -> Self {
        Self {
            store_root: store_root.into(),
            folder_prefix: DEFAULT_FOLDER_PREFIX,
            default_volume: DEFAULT_VOLUME.to_string(),
            default_suffix: String::new(),
        }
    }

    /// Configuration for a named store in the platform cache directory
    pub fn named(store_name: &str) -> Self {
        Self::new(default_stores_dir().join(store_name))
    }

    /// Override the default suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.default_suffix = suffix.into();
        self
    }

    /// Override the default volume
    pub fn with_volume(mut self, volume: impl Into<String>) -> Self {
        self.default_volume = volume.into();
        self
    }
}

/// Parent directory of named stores
pub fn default_stores_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memokit")
}

/// A fully specified path request
///
/// Unset fields fall back to the store configuration; `chapter` falls back
/// to the guid prefix.
#[derive(Debug, Clone, Default)]
pub struct PathRequest<'a> {
    pub guid: &'a str,
    pub volume: Option<&'a str>,
    pub chapter: Option<&'a str>,
    pub suffix: Option<&'a str>,
}

impl<'a> PathRequest<'a> {
    pub fn new(guid: &'a str) -> Self {
        Self {
            guid,
            ..Self::default()
        }
    }

    pub fn volume(mut self, volume: &'a str) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn chapter(mut self, chapter: &'a str) -> Self {
        self.chapter = Some(chapter);
        self
    }

    pub fn suffix(mut self, suffix: &'a str) -> Self {
        self.suffix = Some(suffix);
        self
    }
}

/// Content-addressed store of guid-named files
#[derive(Debug)]
pub struct GuidStore {
    config: StoreConfig,
}

impl GuidStore {
    /// Open a store, creating its root directory if needed
    ///
    /// A `folder_prefix` of zero falls back to [`DEFAULT_FOLDER_PREFIX`].
    pub fn new(mut config: StoreConfig) -> MemoResult<Self> {
        if config.folder_prefix == 0 {
            config.folder_prefix = DEFAULT_FOLDER_PREFIX;
        }
        std::fs::create_dir_all(&config.store_root).map_err(|e| MemoError::StoreRoot {
            path: config.store_root.clone(),
            source: e,
        })?;
        debug!("Opened guid store at {}", config.store_root.display());
        Ok(Self { config })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.config.store_root
    }

    /// Store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Volume used when none is given
    pub fn default_volume(&self) -> &str {
        &self.config.default_volume
    }

    /// Directory holding every chapter of `volume`
    pub fn volume_dir(&self, volume: &str) -> PathBuf {
        self.config.store_root.join(volume)
    }

    /// Chapter directory name for `guid`
    pub fn chapter_of<'g>(&self, guid: &'g str) -> &'g str {
        match guid.char_indices().nth(self.config.folder_prefix) {
            Some((idx, _)) => &guid[..idx],
            None => guid,
        }
    }

    /// Path of `guid` in `volume`, creating the volume and chapter directories
    pub fn path(&self, volume: Option<&str>, guid: &str, suffix: Option<&str>) -> MemoResult<PathBuf> {
        self.path_for(&PathRequest {
            guid,
            volume,
            chapter: None,
            suffix,
        })
    }

    /// Path for a fully specified request, creating its directories
    pub fn path_for(&self, request: &PathRequest<'_>) -> MemoResult<PathBuf> {
        let volume = request.volume.unwrap_or(&self.config.default_volume);
        let chapter = request
            .chapter
            .unwrap_or_else(|| self.chapter_of(request.guid));
        let suffix = request.suffix.unwrap_or(&self.config.default_suffix);

        let chapter_dir = self.volume_dir(volume).join(chapter);
        ensure_dir(&self.volume_dir(volume))?;
        ensure_dir(&chapter_dir)?;

        Ok(chapter_dir.join(format!("{}{}", request.guid, suffix)))
    }

    /// Delete every file in `volume`, returning how many were removed
    ///
    /// Files already deleted stay deleted if a later delete fails.
    pub async fn clear_volume(&self, volume: &str) -> MemoResult<usize> {
        let root = self.volume_dir(volume);
        if !root.exists() {
            return Ok(0);
        }

        let mut walker = crate::files::FileWalker::new(&root);
        let mut count = 0;
        while let Some(entry) = walker.next().await? {
            tokio::fs::remove_file(&entry.path).await.map_err(|e| {
                MemoError::io(format!("removing {}", entry.path.display()), e)
            })?;
            count += 1;
        }

        info!("Cleared {} file(s) from volume {}", count, volume);
        Ok(count)
    }
}

fn ensure_dir(dir: &Path) -> MemoResult<()> {
    match std::fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(MemoError::io(format!("creating directory {}", dir.display()), e)),
    }
}
