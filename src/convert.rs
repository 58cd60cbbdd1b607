//! Bounded-memory CSV to Parquet conversion.
//!
//! The source is too large to decode and re-encode in one pass, so
//! [`ChunkedConverter::run`] works in two phases:
//!
//! 1. **Ingest**: stream the source in chunks of at most `chunk_size` rows and
//!    write each chunk to its own ZSTD Parquet scratch artifact
//!    (`chunk_0001.parquet`, ...). Only one chunk is held in memory at a time.
//! 2. **Merge**: reload every scratch artifact in sequence order, concatenate
//!    them under a promoted schema (see [`Table::concat`]), and write the final
//!    artifact.
//!
//! On success the scratch artifacts and directory are deleted. On failure the
//! same cleanup is attempted and its outcome travels with the error as a
//! [`ConversionFailed`] context, retrievable with `anyhow::Error::downcast_ref`.
//!
//! ```no_run
//! use ironchunk::config::ConvertConfig;
//! use ironchunk::convert::ChunkedConverter;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = ConvertConfig::new("payments.csv.gz", "payments.parquet").with_chunk_size(100_000);
//! let report = ChunkedConverter::new(cfg).run()?;
//! assert_eq!(report.rows, report.chunk_rows.iter().map(|&n| n as u64).sum::<u64>());
//! # Ok(())
//! # }
//! ```

use crate::config::ConvertConfig;
use crate::io::csv::CsvChunks;
use crate::io::parquet::{read_table, write_batches, write_table};
use crate::metrics::ConversionReport;
use crate::scratch::{CleanupReport, ScratchSpace};
use crate::table::Table;
use anyhow::{Context, Result, bail};
use arrow::datatypes::SchemaRef;
use serde::Serialize;
use std::fmt;
use std::fs::{metadata, remove_file};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// Log a "completed" line every this many chunks.
const INGEST_PROGRESS_EVERY: usize = 10;
/// Log a "reading" line every this many reloaded scratch artifacts.
const MERGE_PROGRESS_EVERY: usize = 20;

/// Phase in which a conversion aborted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ConversionStage {
    /// Scratch directory could not be created.
    Prepare,
    /// Removing the old destination, reading the source, or writing a scratch artifact.
    Ingest,
    /// Reloading scratch artifacts, concatenating, or writing the final artifact.
    Merge,
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prepare => "prepare",
            Self::Ingest => "ingest",
            Self::Merge => "merge",
        })
    }
}

/// Error context attached to every failed [`ChunkedConverter::run`].
#[derive(Clone, Debug)]
pub struct ConversionFailed {
    pub stage: ConversionStage,
    /// Outcome of the best-effort scratch cleanup that followed the failure.
    pub cleanup: CleanupReport,
}

impl fmt::Display for ConversionFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conversion failed during {} ({})", self.stage, self.cleanup)
    }
}

/// Runs the chunk-and-merge conversion described in the [module docs](self).
#[derive(Clone, Debug)]
pub struct ChunkedConverter {
    config: ConvertConfig,
}

struct Ingested {
    schema: SchemaRef,
    chunk_rows: Vec<usize>,
    rows: u64,
}

impl ChunkedConverter {
    #[must_use]
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    /// Convert the configured source into the configured destination.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, or if any ingest or
    /// merge step fails. In the latter case the error carries a
    /// [`ConversionFailed`] context describing the stage and the cleanup.
    pub fn run(&self) -> Result<ConversionReport> {
        self.config.validate()?;
        let cfg = &self.config;
        let started = Instant::now();
        info!(
            source = %cfg.source.display(),
            destination = %cfg.destination.display(),
            chunk_size = cfg.chunk_size,
            "starting conversion"
        );

        let mut scratch = ScratchSpace::prepare(&cfg.scratch_dir).map_err(|e| {
            e.context(ConversionFailed {
                stage: ConversionStage::Prepare,
                cleanup: CleanupReport::default(),
            })
        })?;

        let outcome = self
            .ingest(&mut scratch)
            .map_err(|e| (ConversionStage::Ingest, e))
            .and_then(|ingested| {
                self.merge(&scratch, &ingested)
                    .map(|bytes| (ingested, bytes))
                    .map_err(|e| (ConversionStage::Merge, e))
            });

        match outcome {
            Ok((ingested, output_bytes)) => {
                info!(artifacts = scratch.artifacts().len(), "cleaning up scratch artifacts");
                let cleanup = scratch.cleanup();
                if !cleanup.is_clean() {
                    warn!(%cleanup, "scratch cleanup incomplete");
                }
                Ok(ConversionReport {
                    source: cfg.source.clone(),
                    destination: cfg.destination.clone(),
                    chunk_size: cfg.chunk_size,
                    chunk_rows: ingested.chunk_rows,
                    rows: ingested.rows,
                    output_bytes,
                    elapsed: started.elapsed(),
                    cleanup,
                })
            }
            Err((stage, err)) => {
                let reason = format!("{err:#}");
                error!(%stage, error = %reason, "conversion aborted, removing scratch artifacts");
                let cleanup = scratch.cleanup();
                Err(err.context(ConversionFailed { stage, cleanup }))
            }
        }
    }

    fn ingest(&self, scratch: &mut ScratchSpace) -> Result<Ingested> {
        let cfg = &self.config;
        remove_stale_destination(&cfg.destination)?;

        let mut chunks = CsvChunks::open(&cfg.source, cfg.chunk_size)?;
        let schema = chunks.schema();
        let mut chunk_rows = Vec::new();
        let mut rows = 0u64;

        while let Some(chunk) = chunks.next_chunk()? {
            let seq = chunk_rows.len() + 1;
            let n = chunk.num_rows();
            rows += n as u64;
            info!(chunk = seq, rows = n, total = rows, "processing chunk");

            let path = scratch.reserve();
            write_batches(&path, chunk.schema(), [&chunk])
                .with_context(|| format!("flush chunk {seq} to {}", path.display()))?;
            chunk_rows.push(n);
            // Release before decoding the next chunk.
            drop(chunk);

            if seq % INGEST_PROGRESS_EVERY == 0 {
                info!("completed {seq} chunks");
            }
        }
        debug_assert_eq!(rows, chunks.rows_read());

        Ok(Ingested {
            schema,
            chunk_rows,
            rows,
        })
    }

    /// Returns the size of the final artifact in bytes.
    fn merge(&self, scratch: &ScratchSpace, ingested: &Ingested) -> Result<u64> {
        let destination = &self.config.destination;
        let artifacts = scratch.artifacts();
        info!(files = artifacts.len(), "combining chunk files into final artifact");

        let mut tables = Vec::with_capacity(artifacts.len());
        for (i, path) in artifacts.iter().enumerate() {
            if (i + 1) % MERGE_PROGRESS_EVERY == 0 {
                info!("reading chunk file {}/{}", i + 1, artifacts.len());
            }
            tables.push(read_table(path).with_context(|| format!("reload chunk {}", i + 1))?);
        }

        info!("concatenating all chunks");
        let merged = if tables.is_empty() {
            Table::empty(ingested.schema.clone())
        } else {
            Table::concat(tables)?
        };

        let written = write_table(destination, &merged)?;
        if written as u64 != ingested.rows {
            bail!(
                "final artifact holds {written} rows but {} were read from the source",
                ingested.rows
            );
        }
        let bytes = metadata(destination)
            .with_context(|| format!("stat {}", destination.display()))?
            .len();
        Ok(bytes)
    }
}

/// Remove any artifact left by a previous run, so output never appends.
///
/// A path that cannot exist (a parent component is a regular file) has nothing
/// to remove; writing to it fails later, during the merge.
fn remove_stale_destination(path: &Path) -> Result<()> {
    match remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed existing destination");
            Ok(())
        }
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove existing {}", path.display())),
    }
}
