//! Scratch storage for per-chunk artifacts.
//!
//! A [`ScratchSpace`] owns one directory and the ordered list of artifact paths
//! handed out inside it. Paths are reserved *before* the artifact is written so
//! that a write that dies halfway still gets a deletion attempt.
//!
//! Cleanup is best effort: [`ScratchSpace::cleanup`] never fails, it reports
//! what it removed and what it could not remove in a [`CleanupReport`].

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs::{create_dir_all, remove_dir, remove_file};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scratch directory plus the artifacts reserved in it, in sequence order.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
    artifacts: Vec<PathBuf>,
}

impl ScratchSpace {
    /// Create `dir` (and parents) if absent.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn prepare(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir).with_context(|| format!("mkdir -p {}", dir.display()))?;
        Ok(Self {
            dir,
            artifacts: Vec::new(),
        })
    }

    /// Reserve the path for the next artifact: `chunk_0001.parquet`, `chunk_0002.parquet`, ...
    pub fn reserve(&mut self) -> PathBuf {
        let seq = self.artifacts.len() + 1;
        let path = self.dir.join(format!("chunk_{seq:04}.parquet"));
        self.artifacts.push(path.clone());
        path
    }

    /// Reserved artifact paths in sequence order.
    #[must_use]
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Delete every reserved artifact that exists, then the directory itself.
    ///
    /// The directory is removed non-recursively, so unrelated files left in it
    /// keep it alive and show up as a failure.
    #[must_use]
    pub fn cleanup(self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for path in self.artifacts {
            if !path.exists() {
                continue;
            }
            match remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "removed scratch artifact");
                    report.removed.push(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not remove scratch artifact");
                    report.failed.push(CleanupFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        if self.dir.exists() {
            match remove_dir(&self.dir) {
                Ok(()) => report.removed.push(self.dir),
                Err(e) => {
                    warn!(dir = %self.dir.display(), error = %e, "could not remove scratch dir");
                    report.failed.push(CleanupFailure {
                        path: self.dir,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

/// A path cleanup could not delete, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of [`ScratchSpace::cleanup`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Artifacts and directory that were deleted.
    pub removed: Vec<PathBuf>,
    /// Paths whose deletion failed.
    pub failed: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// `true` when every deletion attempt succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed {} scratch path(s), {} could not be removed",
            self.removed.len(),
            self.failed.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reserves_zero_padded_sequence() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut scratch = ScratchSpace::prepare(tmp.path().join("chunks"))?;
        let first = scratch.reserve();
        let second = scratch.reserve();
        assert!(first.ends_with("chunk_0001.parquet"));
        assert!(second.ends_with("chunk_0002.parquet"));
        assert_eq!(scratch.artifacts(), &[first, second]);
        Ok(())
    }

    #[test]
    fn cleanup_removes_artifacts_and_dir() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let dir = tmp.path().join("chunks");
        let mut scratch = ScratchSpace::prepare(&dir)?;
        fs::write(scratch.reserve(), b"x")?;
        let _never_written = scratch.reserve();

        let report = scratch.cleanup();
        assert!(report.is_clean());
        assert_eq!(report.removed.len(), 2);
        assert!(!dir.exists());
        Ok(())
    }

    #[test]
    fn foreign_file_keeps_dir_and_is_reported() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let dir = tmp.path().join("chunks");
        let scratch = ScratchSpace::prepare(&dir)?;
        fs::write(dir.join("keep.me"), b"x")?;

        let report = scratch.cleanup();
        assert!(!report.is_clean());
        assert_eq!(report.failed[0].path, dir);
        assert!(dir.join("keep.me").exists());
        Ok(())
    }
}
