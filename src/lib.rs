//! # Ironchunk
//!
//! Convert a delimited text table that does not fit in memory into a single
//! Parquet file, then query the result by column.
//!
//! ## Key Features
//!
//! - **Bounded-memory conversion** - the source is read in chunks of at most N rows;
//!   each chunk is written to its own scratch Parquet file before the next is read
//! - **Merge with schema promotion** - scratch files are concatenated in order into
//!   one ZSTD-compressed artifact, tolerating type and nullability drift between chunks
//! - **Zero data loss** - every cell is stored as text, exactly as it appeared
//! - **Compressed sources** - `.gz`, `.zst`, `.bz2` and `.xz` inputs are decoded transparently
//! - **Column filters** - exact (case-sensitive) and substring (case-insensitive)
//!   matches over a fully loaded artifact, in one-shot or interactive mode
//!
//! ## Quick Start
//!
//! ```no_run
//! use ironchunk::config::{ConvertConfig, SearchConfig};
//! use ironchunk::convert::ChunkedConverter;
//! use ironchunk::filter::TableFilter;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let cfg = ConvertConfig::new("payments.csv", "payments.parquet")
//!     .with_scratch_dir("temp_chunks")
//!     .with_chunk_size(50_000);
//! let report = ChunkedConverter::new(cfg).run()?;
//! println!("{} rows in {} chunks", report.rows, report.chunks());
//!
//! let filter = TableFilter::load("payments.parquet")?;
//! let hits = filter.filter_contains("recipient", "clinic")?;
//! println!("{} matching rows", hits.count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Binaries
//!
//! - `chunked-convert` runs [`ChunkedConverter`](convert::ChunkedConverter) with
//!   [`ConvertConfig::default`](config::ConvertConfig::default)
//! - `table-search` runs the [`shell`] against
//!   [`SearchConfig::default`](config::SearchConfig::default)
//!
//! Both log through `tracing`; set `RUST_LOG=debug` for more detail.
//!
//! ## Feature Flags
//!
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`, `compression-xz` -
//!   source decompression codecs (all enabled by default)
//!
//! ## Module Overview
//!
//! - [`config`] - run parameters and their defaults
//! - [`io`] - CSV chunk reader, Parquet read/write, source decompression
//! - [`table`] - in-memory tables and schema promotion
//! - [`scratch`] - scratch artifact bookkeeping and cleanup
//! - [`convert`] - the chunk-and-merge converter
//! - [`metrics`] - conversion report
//! - [`filter`] - column queries over a loaded artifact
//! - [`shell`] - command parsing, batch and interactive front-ends
//! - [`testing`] - fixtures and assertions for tests

pub mod config;
pub mod convert;
pub mod filter;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod scratch;
pub mod shell;
pub mod table;
pub mod testing;
pub mod utils;

pub use config::{ConvertConfig, SearchConfig};
pub use convert::{ChunkedConverter, ConversionFailed, ConversionStage};
pub use filter::{FilterError, Matches, Query, TableFilter};
pub use metrics::ConversionReport;
pub use scratch::{CleanupReport, ScratchSpace};
pub use table::Table;
