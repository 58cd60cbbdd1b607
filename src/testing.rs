//! Testing utilities for conversions and filters.
//!
//! - **Fixtures**: synthetic CSV sources written into a temp dir
//! - **Assertions**: read a column of a [`Table`](crate::table::Table) back as text
//!
//! ```
//! use ironchunk::config::ConvertConfig;
//! use ironchunk::convert::ChunkedConverter;
//! use ironchunk::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let tmp = tempfile::tempdir()?;
//! let source = write_csv_fixture(tmp.path(), "people.csv", PEOPLE_CSV)?;
//! let cfg = ConvertConfig::new(&source, tmp.path().join("people.parquet"))
//!     .with_scratch_dir(tmp.path().join("chunks"))
//!     .with_chunk_size(2);
//! let report = ChunkedConverter::new(cfg).run()?;
//! assert_eq!(report.chunk_rows, vec![2, 1]);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
