//! Prune sweep results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format bytes as human-readable size (e.g., "1.5 GB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Outcome of one completed prune sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    /// When the sweep started
    pub started: DateTime<Utc>,

    /// When the sweep finished
    pub done: DateTime<Utc>,

    /// Oldest modification time seen (the start time if nothing older)
    pub earliest: DateTime<Utc>,

    /// Total size of every file visited
    pub bytes_scanned: u64,

    /// Total size of deleted files
    pub bytes_pruned: u64,

    /// Number of deleted files
    pub files_pruned: u64,
}

impl PruneReport {
    /// Wall-clock duration of the sweep
    pub fn elapsed(&self) -> chrono::Duration {
        self.done - self.started
    }
}

impl fmt::Display for PruneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pruned {} file(s), {} of {} scanned in {:.1}s",
            self.files_pruned,
            format_bytes(self.bytes_pruned),
            format_bytes(self.bytes_scanned),
            self.elapsed().num_milliseconds() as f64 / 1000.0
        )
    }
}
