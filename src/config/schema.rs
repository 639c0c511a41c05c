//! Configuration schema for memokit
//!
//! Configuration is stored at `~/.config/memokit/config.toml`. Every section
//! and key is optional.

use crate::cache::{CacheOptions, Flag, DEFAULT_STORE_NAME, DEFAULT_SUFFIX};
use crate::error::MemoResult;
use crate::memoizer::{MemoizerOptions, DEFAULT_CONTEXT};
use crate::prune::{PrunerOptions, DEFAULT_PRUNE_DAYS};
use crate::store::{default_stores_dir, GuidStore, StoreConfig, DEFAULT_FOLDER_PREFIX, DEFAULT_VOLUME};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoConfig {
    /// Store layout
    pub store: StoreSection,

    /// Cache tiers
    pub cache: CacheSection,

    /// Memoizer defaults
    pub memoizer: MemoizerSection,

    /// Pruning
    pub pruner: PrunerSection,

    /// Log output
    pub logging: LoggingConfig,
}

/// Store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Explicit store root, overriding `name`
    pub path: Option<PathBuf>,

    /// Store name below the platform cache directory
    pub name: String,

    /// Guid characters used as the chapter directory
    pub folder_prefix: usize,

    /// Default volume
    pub volume: String,

    /// Default file suffix of the store
    pub suffix: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: None,
            name: DEFAULT_STORE_NAME.to_string(),
            folder_prefix: DEFAULT_FOLDER_PREFIX,
            volume: DEFAULT_VOLUME.to_string(),
            suffix: String::new(),
        }
    }
}

/// Cache tier switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub write_mem: bool,
    pub write_file: bool,

    /// Follows `write_file` when unset
    pub read_file: Option<bool>,

    /// Suffix of cache files
    pub suffix: String,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            write_mem: true,
            write_file: true,
            read_file: None,
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

/// Memoizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoizerSection {
    /// Context used when a call names none
    pub context: String,
}

impl Default for MemoizerSection {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT.to_string(),
        }
    }
}

/// Pruner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrunerSection {
    /// Directory to sweep (default: the store root)
    pub root: Option<PathBuf>,

    /// Retention window in days
    pub prune_days: u32,
}

impl Default for PrunerSection {
    fn default() -> Self {
        Self {
            root: None,
            prune_days: DEFAULT_PRUNE_DAYS,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl MemoConfig {
    /// Resolved store root
    pub fn store_root(&self) -> PathBuf {
        match &self.store.path {
            Some(path) => path.clone(),
            None => default_stores_dir().join(&self.store.name),
        }
    }

    /// Store configuration described by `[store]`
    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::new(self.store_root())
            .with_volume(&self.store.volume)
            .with_suffix(&self.store.suffix);
        config.folder_prefix = self.store.folder_prefix;
        config
    }

    /// Cache options described by `[store]` and `[cache]`
    ///
    /// Opens the store, creating its root directory.
    pub fn cache_options(&self) -> MemoResult<CacheOptions> {
        let store = GuidStore::new(self.store_config())?;
        Ok(CacheOptions {
            write_mem: Flag::from(self.cache.write_mem),
            write_file: Flag::from(self.cache.write_file),
            read_file: self.cache.read_file.map(Flag::from),
            suffix: self.cache.suffix.clone(),
            ..CacheOptions::with_store(Arc::new(store))
        })
    }

    /// Memoizer options over a cache built from this configuration
    pub fn memoizer_options(&self) -> MemoResult<MemoizerOptions> {
        Ok(MemoizerOptions {
            context: self.memoizer.context.clone(),
            cache: None,
            cache_options: self.cache_options()?,
        })
    }

    /// Pruner options described by `[pruner]`
    pub fn pruner_options(&self) -> PrunerOptions {
        let root = self.pruner.root.clone().unwrap_or_else(|| self.store_root());
        PrunerOptions::new(root).prune_days(self.pruner.prune_days)
    }
}
