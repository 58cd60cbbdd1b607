//! Parquet artifact I/O.
//!
//! This module provides:
//! - [`write_batches`] / [`write_table`]: persist record batches as one Parquet
//!   file, ZSTD-compressed, schema embedded in the footer
//! - [`read_table`]: load a whole artifact into a [`Table`]
//! - [`artifact_row_count`]: row count from footer metadata, without decoding pages
//!
//! Scratch artifacts and the final artifact share the same writer settings.

use crate::table::Table;
use anyhow::{Context, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::{File, create_dir_all};
use std::path::Path;

/// Batch size used when decoding artifacts back into memory.
const READ_BATCH_ROWS: usize = 64 * 1024;

/// Writer settings shared by every artifact this crate produces.
#[must_use]
pub fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build()
}

/// Write `batches` (all conforming to `schema`) to a single Parquet file at `path`.
///
/// Creates parent directories if needed and truncates any existing file.
/// An empty batch sequence produces a valid zero-row file carrying `schema`.
///
/// # Returns
/// The number of rows written.
///
/// # Errors
/// Returns an error if the file cannot be created or any batch fails to encode.
pub fn write_batches<'a>(
    path: impl AsRef<Path>,
    schema: SchemaRef,
    batches: impl IntoIterator<Item = &'a RecordBatch>,
) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(writer_properties()))
        .context("create ArrowWriter")?;

    let mut rows = 0usize;
    for (i, batch) in batches.into_iter().enumerate() {
        writer
            .write(batch)
            .with_context(|| format!("write batch #{} to {}", i + 1, path.display()))?;
        rows += batch.num_rows();
    }
    writer
        .close()
        .with_context(|| format!("finalize {}", path.display()))?;
    Ok(rows)
}

/// Write every batch of `table` to `path`. See [`write_batches`].
///
/// # Errors
/// See [`write_batches`].
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> Result<usize> {
    write_batches(path, table.schema(), table.batches())
}

/// Load the entire artifact at `path` into memory.
///
/// # Errors
/// Returns an error if the file cannot be opened, is not valid Parquet, or a
/// batch fails to decode.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("read Parquet footer of {}", path.display()))?;
    let schema = builder.schema().clone();
    let reader = builder
        .with_batch_size(READ_BATCH_ROWS)
        .build()
        .context("build ParquetRecordBatchReader")?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("decode batches of {}", path.display()))?;
    Table::new(schema, batches)
}

/// Total rows recorded in the artifact's footer.
///
/// # Errors
/// Returns an error if the file cannot be opened or its metadata cannot be read.
pub fn artifact_row_count(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("open SerializedFileReader")?;
    let meta = reader.metadata();
    Ok((0..meta.num_row_groups())
        .map(|i| meta.row_group(i).num_rows().cast_unsigned())
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn names_batch(values: &[Option<&str>]) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, true)]));
        let col: ArrayRef = Arc::new(StringArray::from(values.to_vec()));
        RecordBatch::try_new(schema, vec![col]).expect("valid batch")
    }

    #[test]
    fn zero_batches_still_write_schema() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("nested/empty.parquet");
        let schema = names_batch(&[]).schema();

        let n = write_batches(&path, schema, std::iter::empty())?;
        assert_eq!(n, 0);

        let table = read_table(&path)?;
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.column_names(), vec!["name"]);
        assert_eq!(artifact_row_count(&path)?, 0);
        Ok(())
    }

    #[test]
    fn nulls_survive_the_file() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("names.parquet");
        let batch = names_batch(&[Some("a"), None, Some("")]);

        write_batches(&path, batch.schema(), [&batch])?;
        let table = read_table(&path)?;
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.batches()[0].column(0), batch.column(0));
        assert_eq!(artifact_row_count(&path)?, 3);
        Ok(())
    }
}
