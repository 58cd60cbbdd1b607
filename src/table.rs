//! In-memory columnar tables.
//!
//! A [`Table`] is a schema plus an ordered list of record batches that all
//! conform to it. Batches are never merged into one contiguous buffer; row order
//! is batch order, then position within the batch.
//!
//! [`Table::concat`] joins tables whose schemas may disagree slightly, using
//! [`promote_schemas`]:
//! - fields keep first-seen order across all inputs
//! - equal types are kept, `Null` yields to the other side, anything else widens to `Utf8`
//! - nullability is OR-ed, and a field missing from some input becomes nullable
//!   and is null-filled there

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, BooleanArray, new_null_array};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use std::collections::HashMap;
use std::sync::Arc;

/// Schema plus ordered batches. See the [module docs](self).
#[derive(Clone, Debug)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Table {
    /// Assemble a table, checking that every batch has `schema`'s fields.
    ///
    /// # Errors
    /// Returns an error if a batch's fields differ from `schema`.
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for (i, batch) in batches.iter().enumerate() {
            if batch.schema().fields() != schema.fields() {
                bail!("batch #{} does not match the table schema", i + 1);
            }
        }
        Ok(Self { schema, batches })
    }

    /// A zero-row table with `schema`.
    #[must_use]
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }

    /// Position of the column called `name`, matched exactly.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name).ok()
    }

    /// The first `limit` rows.
    #[must_use]
    pub fn head(&self, limit: usize) -> Self {
        let mut remaining = limit;
        let mut batches = Vec::new();
        for batch in &self.batches {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(batch.num_rows());
            if take > 0 {
                batches.push(batch.slice(0, take));
            }
            remaining -= take;
        }
        Self {
            schema: self.schema.clone(),
            batches,
        }
    }

    /// Keep the rows for which `mask_fn` yields `true`; null mask slots drop the row.
    ///
    /// # Errors
    /// Returns an error if `mask_fn` fails or the mask does not fit its batch.
    pub fn select<F, E>(&self, mut mask_fn: F) -> Result<Self, E>
    where
        F: FnMut(&RecordBatch) -> Result<BooleanArray, E>,
        E: From<ArrowError>,
    {
        let mut batches = Vec::with_capacity(self.batches.len());
        for batch in &self.batches {
            let mask = mask_fn(batch)?;
            let kept = filter_record_batch(batch, &mask)?;
            if kept.num_rows() > 0 {
                batches.push(kept);
            }
        }
        Ok(Self {
            schema: self.schema.clone(),
            batches,
        })
    }

    /// Render all rows as a boxed text grid. Nulls render as empty cells.
    ///
    /// # Errors
    /// Returns an error if a column type cannot be formatted.
    pub fn render(&self) -> Result<String> {
        let grid = if self.batches.is_empty() {
            pretty_format_batches(&[RecordBatch::new_empty(self.schema.clone())])
        } else {
            pretty_format_batches(&self.batches)
        };
        Ok(grid.context("format table")?.to_string())
    }

    /// Concatenate `tables` in order under their promoted schema.
    ///
    /// # Errors
    /// Returns an error if `tables` is empty or a column cannot be cast to its
    /// promoted type.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Result<Self> {
        let tables: Vec<Table> = tables.into_iter().collect();
        if tables.is_empty() {
            bail!("no tables to concatenate");
        }
        let schema = Arc::new(promote_schemas(tables.iter().map(|t| t.schema.as_ref())));

        let mut batches = Vec::new();
        for (i, table) in tables.into_iter().enumerate() {
            for batch in table.batches {
                let conformed = conform_batch(&batch, &schema)
                    .with_context(|| format!("promote table #{} to the merged schema", i + 1))?;
                batches.push(conformed);
            }
        }
        Ok(Self { schema, batches })
    }
}

/// Merge `schemas` into one that every input can be cast to.
///
/// See the [module docs](self) for the rules.
pub fn promote_schemas<'a>(schemas: impl IntoIterator<Item = &'a Schema>) -> Schema {
    let mut fields: Vec<(String, DataType, bool, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut inputs = 0usize;

    for schema in schemas {
        inputs += 1;
        for field in schema.fields() {
            match index.get(field.name()) {
                Some(&i) => {
                    let slot = &mut fields[i];
                    slot.1 = widen(&slot.1, field.data_type());
                    slot.2 |= field.is_nullable();
                    slot.3 += 1;
                }
                None => {
                    index.insert(field.name().clone(), fields.len());
                    fields.push((
                        field.name().clone(),
                        field.data_type().clone(),
                        field.is_nullable(),
                        1,
                    ));
                }
            }
        }
    }

    Schema::new(
        fields
            .into_iter()
            .map(|(name, ty, nullable, seen)| Field::new(name, ty, nullable || seen < inputs))
            .collect::<Vec<_>>(),
    )
}

fn widen(a: &DataType, b: &DataType) -> DataType {
    match (a, b) {
        _ if a == b => a.clone(),
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        _ => DataType::Utf8,
    }
}

/// Reshape `batch` to `target`: reorder, cast, and null-fill missing columns.
fn conform_batch(batch: &RecordBatch, target: &SchemaRef) -> Result<RecordBatch> {
    let source = batch.schema();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(target.fields().len());
    for field in target.fields() {
        let column = match source.index_of(field.name()) {
            Ok(i) if batch.column(i).data_type() == field.data_type() => batch.column(i).clone(),
            Ok(i) => cast(batch.column(i), field.data_type())
                .with_context(|| format!("cast column '{}' to {}", field.name(), field.data_type()))?,
            Err(_) => new_null_array(field.data_type(), batch.num_rows()),
        };
        columns.push(column);
    }
    RecordBatch::try_new(target.clone(), columns).context("assemble promoted batch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray};

    fn utf8_table(name: &str, nullable: bool, values: Vec<Option<&str>>) -> Table {
        let schema = Arc::new(Schema::new(vec![Field::new(name, DataType::Utf8, nullable)]));
        let col: ArrayRef = Arc::new(StringArray::from(values));
        let batch = RecordBatch::try_new(schema.clone(), vec![col]).expect("valid batch");
        Table::new(schema, vec![batch]).expect("valid table")
    }

    #[test]
    fn concat_keeps_order_and_ors_nullability() -> Result<()> {
        let a = utf8_table("v", false, vec![Some("1"), Some("2")]);
        let b = utf8_table("v", true, vec![None]);
        let merged = Table::concat([a, b])?;
        assert_eq!(merged.num_rows(), 3);
        assert!(merged.schema().field(0).is_nullable());
        let last = merged.batches()[1]
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("utf8");
        assert!(last.is_null(0));
        Ok(())
    }

    #[test]
    fn mismatched_types_widen_to_text() -> Result<()> {
        let a = utf8_table("v", true, vec![Some("x")]);
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
        let col: ArrayRef = Arc::new(Int64Array::from(vec![42]));
        let b = Table::new(schema.clone(), vec![RecordBatch::try_new(schema, vec![col])?])?;

        let merged = Table::concat([a, b])?;
        assert_eq!(merged.schema().field(0).data_type(), &DataType::Utf8);
        let tail = merged.batches()[1]
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("utf8");
        assert_eq!(tail.value(0), "42");
        Ok(())
    }

    #[test]
    fn missing_columns_are_null_filled() -> Result<()> {
        let a = utf8_table("a", false, vec![Some("1")]);
        let b = utf8_table("b", false, vec![Some("2")]);
        let merged = Table::concat([a, b])?;
        assert_eq!(merged.column_names(), vec!["a", "b"]);
        assert!(merged.schema().fields().iter().all(|f| f.is_nullable()));
        assert_eq!(merged.batches()[0].column(1).null_count(), 1);
        assert_eq!(merged.batches()[1].column(0).null_count(), 1);
        Ok(())
    }

    #[test]
    fn null_type_yields() {
        let a = Schema::new(vec![Field::new("x", DataType::Null, true)]);
        let b = Schema::new(vec![Field::new("x", DataType::Utf8, false)]);
        let merged = promote_schemas([&a, &b]);
        assert_eq!(merged.field(0).data_type(), &DataType::Utf8);
        assert!(merged.field(0).is_nullable());
    }

    #[test]
    fn head_spans_batches() -> Result<()> {
        let a = utf8_table("v", true, vec![Some("1"), Some("2")]);
        let b = utf8_table("v", true, vec![Some("3"), Some("4")]);
        let merged = Table::concat([a, b])?;
        assert_eq!(merged.head(3).num_rows(), 3);
        assert_eq!(merged.head(0).num_rows(), 0);
        assert_eq!(merged.head(100).num_rows(), 4);
        Ok(())
    }

    #[test]
    fn empty_table_renders_header() -> Result<()> {
        let t = utf8_table("city", true, vec![]).head(0);
        assert!(t.render()?.contains("city"));
        Ok(())
    }

    #[test]
    fn concat_of_nothing_fails() {
        assert!(Table::concat(Vec::<Table>::new()).is_err());
    }
}
