//! Recursive file enumeration
//!
//! A lazy, depth-first walk over every regular file below a root directory.
//! Each call to [`FileWalker::new`] starts a fresh walk; nothing is cached
//! between walks.

use crate::error::{MemoError, MemoResult};
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A regular file found during a walk
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute (root-joined) path of the file
    pub path: PathBuf,

    /// Metadata captured when the file was visited
    pub metadata: Metadata,
}

impl FileEntry {
    /// Size of the file in bytes
    pub fn size(&self) -> u64 {
        self.metadata.len()
    }

    /// Path relative to `root`, or the full path if it is not below `root`
    pub fn relative_to(&self, root: &Path) -> &Path {
        self.path.strip_prefix(root).unwrap_or(&self.path)
    }
}

/// Lazy async walker over the files below a root
///
/// Directories are expanded on demand, so a walk that is abandoned early
/// never touches the rest of the tree.
pub struct FileWalker {
    stack: Vec<PathBuf>,
}

impl FileWalker {
    /// Start a walk at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            stack: vec![root.into()],
        }
    }

    /// Advance to the next regular file
    ///
    /// Paths that disappear while the walk is in progress are skipped.
    pub async fn next(&mut self) -> MemoResult<Option<FileEntry>> {
        while let Some(path) = self.stack.pop() {
            let metadata = match fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(MemoError::io(format!("reading metadata of {}", path.display()), e))
                }
            };

            if metadata.is_dir() {
                let mut entries = match fs::read_dir(&path).await {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => {
                        return Err(MemoError::io(format!("reading directory {}", path.display()), e))
                    }
                };

                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| MemoError::io(format!("reading entry in {}", path.display()), e))?
                {
                    self.stack.push(entry.path());
                }
            } else if metadata.is_file() {
                return Ok(Some(FileEntry { path, metadata }));
            }
        }

        Ok(None)
    }
}

/// Collect every file below `root`
pub async fn collect_files(root: impl Into<PathBuf>) -> MemoResult<Vec<FileEntry>> {
    let mut walker = FileWalker::new(root);
    let mut files = Vec::new();
    while let Some(entry) = walker.next().await? {
        files.push(entry);
    }
    Ok(files)
}
