//! Run configuration for the converter and the filter tool.
//!
//! Both binaries take no flags; their parameters come from the `Default`
//! implementations below. Tests and library callers build their own values with
//! the `with_*` setters.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default source table consumed by `chunked-convert`.
pub const DEFAULT_SOURCE: &str = "OP_DTL_GNRL_PGYR2023_P01302025_01212025.csv";
/// Default final artifact written by `chunked-convert` and read by `table-search`.
pub const DEFAULT_DESTINATION: &str = "OP_DTL_GNRL_PGYR2023_P01302025_01212025.parquet";
/// Default scratch directory for per-chunk artifacts.
pub const DEFAULT_SCRATCH_DIR: &str = "temp_chunks";
/// Default number of rows per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;
/// Default number of rows shown in previews.
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Parameters of one chunked conversion run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Delimited text table to read (may be compressed, see [`crate::io::compression`]).
    pub source: PathBuf,
    /// Final Parquet artifact. Any existing file here is removed before the run.
    pub destination: PathBuf,
    /// Directory holding the per-chunk scratch artifacts.
    pub scratch_dir: PathBuf,
    /// Maximum rows per chunk; must be positive.
    pub chunk_size: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            destination: PathBuf::from(DEFAULT_DESTINATION),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ConvertConfig {
    /// Build a config for `source` -> `destination` with the default scratch dir and chunk size.
    pub fn new(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            destination: destination.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.scratch_dir = dir.as_ref().to_path_buf();
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, rows: usize) -> Self {
        self.chunk_size = rows;
        self
    }

    /// Reject configurations the converter cannot run with.
    ///
    /// # Errors
    /// Returns an error if `chunk_size` is zero or the destination is inside the scratch dir.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk size must be a positive number of rows");
        }
        if self.destination.starts_with(&self.scratch_dir) {
            bail!(
                "destination {} must not live inside the scratch dir {}",
                self.destination.display(),
                self.scratch_dir.display()
            );
        }
        Ok(())
    }
}

/// Parameters of the filter tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Columnar artifact to load.
    pub artifact: PathBuf,
    /// Rows shown in previews and result listings.
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            artifact: PathBuf::from(DEFAULT_DESTINATION),
            limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

impl SearchConfig {
    pub fn new(artifact: impl AsRef<Path>) -> Self {
        Self {
            artifact: artifact.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}
