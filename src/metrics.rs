//! Conversion run reporting.
//!
//! [`ConversionReport`] is what a successful [`ChunkedConverter::run`](crate::convert::ChunkedConverter::run)
//! returns. It can be printed for an operator or saved as JSON next to the
//! artifact for later inspection.
//!
//! ```no_run
//! use ironchunk::config::ConvertConfig;
//! use ironchunk::convert::ChunkedConverter;
//!
//! # fn main() -> anyhow::Result<()> {
//! let report = ChunkedConverter::new(ConvertConfig::new("in.csv", "out.parquet")).run()?;
//! report.print();
//! report.save_to_file("out.report.json")?;
//! # Ok(())
//! # }
//! ```

use crate::scratch::CleanupReport;
use crate::utils::{format_gib, group_thousands};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Summary of one completed conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Configured maximum rows per chunk.
    pub chunk_size: usize,
    /// Row count of each chunk, in sequence order.
    pub chunk_rows: Vec<usize>,
    /// Rows written to the final artifact.
    pub rows: u64,
    /// Size of the final artifact on disk.
    pub output_bytes: u64,
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
    pub cleanup: CleanupReport,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl ConversionReport {
    /// Number of chunks (and scratch artifacts) the source was split into.
    #[must_use]
    pub fn chunks(&self) -> usize {
        self.chunk_rows.len()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Print the operator-facing summary to stdout.
    pub fn print(&self) {
        println!("\nConversion complete!");
        println!("Total rows processed: {}", group_thousands(self.rows));
        println!("Output file: {}", self.destination.display());
        println!("Output file size: {} GB", format_gib(self.output_bytes));
        println!(
            "Chunks: {} of up to {} rows, {:.1}s",
            self.chunks(),
            group_thousands(self.chunk_size as u64),
            self.elapsed.as_secs_f64()
        );
        if self.cleanup.is_clean() {
            println!("Cleanup complete!");
        } else {
            println!("Cleanup incomplete: {}", self.cleanup);
            for failure in &self.cleanup.failed {
                println!("  - {}: {}", failure.path.display(), failure.reason);
            }
        }
    }

    /// Save the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(self).context("serialize report")?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}
