//! Age-based file pruning

use crate::error::{MemoError, MemoResult};
use crate::files::FileWalker;
use crate::prune::report::{format_bytes, PruneReport};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default retention window in days
pub const DEFAULT_PRUNE_DAYS: u32 = 180;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Decides whether an aged file is actually deleted
///
/// Called once per file whose modification time is past the retention
/// window. Returning `false` keeps the file.
#[async_trait]
pub trait PruneFilter: Send + Sync {
    async fn should_prune(&self, path: &Path, metadata: &Metadata) -> bool;
}

/// Filter that deletes every aged file
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPrune;

#[async_trait]
impl PruneFilter for AlwaysPrune {
    async fn should_prune(&self, _path: &Path, _metadata: &Metadata) -> bool {
        true
    }
}

#[async_trait]
impl<F> PruneFilter for F
where
    F: Fn(&Path, &Metadata) -> bool + Send + Sync,
{
    async fn should_prune(&self, path: &Path, metadata: &Metadata) -> bool {
        self(path, metadata)
    }
}

/// Options for building a [`FilePruner`]
#[derive(Clone)]
pub struct PrunerOptions {
    /// Directory to sweep (must exist)
    pub root: PathBuf,

    /// Files last modified this many days ago or earlier are aged
    pub prune_days: u32,

    /// Filter used by [`FilePruner::prune_old_files`]
    pub filter: Arc<dyn PruneFilter>,
}

impl PrunerOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prune_days: DEFAULT_PRUNE_DAYS,
            filter: Arc::new(AlwaysPrune),
        }
    }

    pub fn prune_days(mut self, prune_days: u32) -> Self {
        self.prune_days = prune_days;
        self
    }

    pub fn filter(mut self, filter: impl PruneFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }
}

/// Clears the busy flag when a sweep ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Deletes files older than a retention window
///
/// Only one sweep runs per pruner at a time; a second request while one is
/// running fails with [`MemoError::PruneBusy`] instead of queueing.
///
/// The pruner works on files directly. A [`MemoCache`](crate::cache::MemoCache)
/// over the same directory keeps serving any pruned entry it still holds in
/// memory.
pub struct FilePruner {
    id: Uuid,
    root: PathBuf,
    prune_days: u32,
    filter: Arc<dyn PruneFilter>,
    pruning: AtomicBool,
    last_report: Mutex<Option<PruneReport>>,
}

impl FilePruner {
    /// Build a pruner over an existing directory
    pub fn new(options: PrunerOptions) -> MemoResult<Self> {
        if !options.root.exists() {
            return Err(MemoError::PrunerRoot(options.root));
        }

        let prune_days = if options.prune_days == 0 {
            DEFAULT_PRUNE_DAYS
        } else {
            options.prune_days
        };

        let id = Uuid::new_v4();
        debug!(
            "Pruner {} watching {} ({} days)",
            id,
            options.root.display(),
            prune_days
        );

        Ok(Self {
            id,
            root: options.root,
            prune_days,
            filter: options.filter,
            pruning: AtomicBool::new(false),
            last_report: Mutex::new(None),
        })
    }

    /// Instance id used in log output
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Directory being swept
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Retention window in days
    pub fn prune_days(&self) -> u32 {
        self.prune_days
    }

    /// Whether a sweep is running
    pub fn is_pruning(&self) -> bool {
        self.pruning.load(Ordering::Acquire)
    }

    /// Report of the last completed sweep
    pub fn last_report(&self) -> Option<PruneReport> {
        self.last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sweep with the configured filter
    pub async fn prune_old_files(&self) -> MemoResult<PruneReport> {
        let filter = Arc::clone(&self.filter);
        self.prune_old_files_with(filter.as_ref()).await
    }

    /// Sweep, consulting `filter` for each aged file
    ///
    /// Any I/O failure aborts the sweep. Files deleted before the failure
    /// stay deleted, and the pruner is ready for another sweep.
    pub async fn prune_old_files_with(&self, filter: &dyn PruneFilter) -> MemoResult<PruneReport> {
        let Some(_busy) = BusyGuard::acquire(&self.pruning) else {
            warn!("Pruner {} ignored request (busy)", self.id);
            return Err(MemoError::PruneBusy {
                root: self.root.clone(),
            });
        };

        match self.sweep(filter).await {
            Ok(report) => {
                info!("Pruner {} done: {}", self.id, report);
                *self
                    .last_report
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
                Ok(report)
            }
            Err(e) => {
                error!("Pruner {} failed: {}", self.id, e);
                Err(e)
            }
        }
    }

    async fn sweep(&self, filter: &dyn PruneFilter) -> MemoResult<PruneReport> {
        let started = Utc::now();
        let now = SystemTime::now();
        let cutoff = now - Duration::from_secs(u64::from(self.prune_days) * SECS_PER_DAY);
        debug!("Pruner {} started at {}", self.id, started);

        let mut earliest = now;
        let mut bytes_scanned = 0;
        let mut bytes_pruned = 0;
        let mut files_pruned = 0;

        let mut walker = FileWalker::new(&self.root);
        while let Some(entry) = walker.next().await? {
            let size = entry.size();
            bytes_scanned += size;

            let modified = entry.metadata.modified().map_err(|e| {
                MemoError::io(format!("reading mtime of {}", entry.path.display()), e)
            })?;
            if modified < earliest {
                earliest = modified;
            }

            if modified <= cutoff && filter.should_prune(&entry.path, &entry.metadata).await {
                info!("Pruning {} ({})", entry.path.display(), format_bytes(size));
                tokio::fs::remove_file(&entry.path).await.map_err(|e| {
                    MemoError::io(format!("pruning {}", entry.path.display()), e)
                })?;
                files_pruned += 1;
                bytes_pruned += size;
            }
        }

        Ok(PruneReport {
            started,
            done: Utc::now(),
            earliest: DateTime::<Utc>::from(earliest),
            bytes_scanned,
            bytes_pruned,
            files_pruned,
        })
    }
}
