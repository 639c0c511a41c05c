//! Error types for memokit
//!
//! All modules use `MemoResult<T>` as their return type.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for memokit operations
pub type MemoResult<T> = Result<T, MemoError>;

/// Boxed error produced by a memoized computation
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that can occur in memokit
#[derive(Error, Debug)]
pub enum MemoError {
    // Configuration errors
    #[error("Failed to create store root {path}: {source}")]
    StoreRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Pruner root does not exist: {0}")]
    PrunerRoot(PathBuf),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Concurrency errors
    #[error("Prune of {root} ignored (busy)")]
    PruneBusy { root: PathBuf },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),


    #[error("Codec error: {0}")]
    Codec(String),

    // Computation errors
    #[error("Memoized computation failed: {0}")]
    Computation(#[source] BoxError),

    #[error(transparent)]
    Shared(Arc<MemoError>),
}

impl MemoError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error came from a configuration problem detected at construction
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::StoreRoot { .. } | Self::PrunerRoot(_) | Self::ConfigInvalid { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::StoreRoot { .. } => Some("Check that the parent directory exists and is writable"),
            Self::PrunerRoot(_) => Some("Create the directory before constructing the pruner"),
            Self::PruneBusy { .. } => Some("Wait for the running sweep to finish, then call again"),
            Self::Shared(inner) => inner.hint(),
            _ => None,
        }
    }
}
