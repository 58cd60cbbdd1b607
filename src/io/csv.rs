//! Streaming CSV ingestion into all-text Arrow chunks.
//!
//! [`CsvChunks`] reads a delimited table with a header row and yields
//! successive [`RecordBatch`]es of at most `chunk_size` rows. Only one chunk is
//! materialized at a time; the caller owns it and decides when it is dropped.
//!
//! # Design notes
//! - Every column is `Utf8` and nullable. Cells are kept verbatim; an empty
//!   field becomes null so that "missing" has one representation.
//! - Dialect rules (quoting, escaping, blank-line skipping) are those of the
//!   `csv` crate's defaults.
//! - A record with a different field count than the header aborts the read.
//! - Duplicate header names get `.1`, `.2`, ... suffixes on later occurrences.

use crate::io::compression::open_source;
use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use csv::StringRecord;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Rough per-cell byte estimate used to pre-size string buffers.
const BYTES_PER_CELL_HINT: usize = 16;
/// Upper bound on pre-sized rows per builder; builders grow past it as rows arrive.
const MAX_PRESIZED_ROWS: usize = 8 * 1024;

/// Chunked reader over a CSV source. See the [module docs](self).
pub struct CsvChunks {
    reader: csv::Reader<Box<dyn Read>>,
    schema: SchemaRef,
    chunk_size: usize,
    record: StringRecord,
    rows_read: u64,
    exhausted: bool,
}

impl CsvChunks {
    /// Open `path` (decompressing if needed) and read its header row.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the header cannot be
    /// decoded, the source has no header, or `chunk_size` is zero.
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let source = open_source(path)?;
        Self::from_reader(source, chunk_size)
            .with_context(|| format!("read CSV header of {}", path.display()))
    }

    /// Build a chunk reader over an already-decoded byte stream.
    ///
    /// # Errors
    /// See [`CsvChunks::open`].
    pub fn from_reader<R: Read + 'static>(reader: R, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            bail!("chunk size must be at least one row");
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(Box::new(reader) as Box<dyn Read>);
        let header = reader.headers().context("decode header row")?.clone();
        if header.is_empty() {
            bail!("source has no header row");
        }
        let fields: Vec<Field> = dedupe_header(header.iter())
            .into_iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect();
        Ok(Self {
            reader,
            schema: Arc::new(Schema::new(fields)),
            chunk_size,
            record: StringRecord::new(),
            rows_read: 0,
            exhausted: false,
        })
    }

    /// All-text schema derived from the header row.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Number of data rows decoded so far (header excluded).
    #[must_use]
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Decode the next chunk, or `None` once the source is exhausted.
    ///
    /// # Errors
    /// Returns an error if a record cannot be decoded.
    pub fn next_chunk(&mut self) -> Result<Option<RecordBatch>> {
        if self.exhausted {
            return Ok(None);
        }
        let width = self.schema.fields().len();
        let rows_hint = self.chunk_size.min(MAX_PRESIZED_ROWS);
        let mut builders: Vec<StringBuilder> = (0..width)
            .map(|_| StringBuilder::with_capacity(rows_hint, rows_hint * BYTES_PER_CELL_HINT))
            .collect();

        let mut rows = 0usize;
        while rows < self.chunk_size {
            let more = self
                .reader
                .read_record(&mut self.record)
                .with_context(|| format!("parse CSV record #{}", self.rows_read + 1))?;
            if !more {
                self.exhausted = true;
                break;
            }
            for (builder, cell) in builders.iter_mut().zip(self.record.iter()) {
                if cell.is_empty() {
                    builder.append_null();
                } else {
                    builder.append_value(cell);
                }
            }
            rows += 1;
            self.rows_read += 1;
        }

        if rows == 0 {
            return Ok(None);
        }
        let columns: Vec<ArrayRef> = builders
            .iter_mut()
            .map(|b| Arc::new(b.finish()) as ArrayRef)
            .collect();
        let batch = RecordBatch::try_new(self.schema.clone(), columns)
            .context("assemble chunk RecordBatch")?;
        Ok(Some(batch))
    }
}

impl Iterator for CsvChunks {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

/// Make header names unique by suffixing repeats with `.1`, `.2`, ...
fn dedupe_header<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let names: Vec<&str> = names.collect();
    let mut taken: HashSet<String> = names.iter().map(|n| (*n).to_string()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        if seen.insert(name) {
            out.push(name.to_string());
            continue;
        }
        let mut n = 1usize;
        let renamed = loop {
            let candidate = format!("{name}.{n}");
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        taken.insert(renamed.clone());
        out.push(renamed);
    }
    out
}
