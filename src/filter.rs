//! Full-scan column filters over a memory-resident artifact.
//!
//! [`TableFilter`] loads a Parquet artifact once and answers:
//! - [`describe`](TableFilter::describe): row/column counts, column names and a preview
//! - [`filter_exact`](TableFilter::filter_exact): case-sensitive string equality
//! - [`filter_contains`](TableFilter::filter_contains): case-insensitive substring match
//!
//! Every query scans the whole column; there is no index. Columns that are not
//! `Utf8` (artifacts produced elsewhere) are cast to text before comparing.
//! Null cells never match.

use crate::io::parquet::read_table;
use crate::table::Table;
use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, StringArray};
use arrow::compute::cast;
use arrow::compute::kernels::cmp::eq;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Failures of a single query. None of them invalidate the loaded table.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Column '{column}' not found!")]
    ColumnNotFound {
        column: String,
        /// Every column of the table, in schema order.
        available: Vec<String>,
    },
    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

/// A column predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// `row[column] == value`, case-sensitive.
    Exact { column: String, value: String },
    /// `needle` occurs in `row[column]`, ignoring case.
    Contains { column: String, needle: String },
}

impl Query {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Exact { column, .. } | Self::Contains { column, .. } => column,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact { column, value } => write!(f, "Exact match for {column} = '{value}'"),
            Self::Contains { column, needle } => {
                write!(f, "Contains search for {column} containing '{needle}'")
            }
        }
    }
}

/// Rows selected by a [`Query`].
#[derive(Clone, Debug)]
pub struct Matches {
    pub query: Query,
    pub rows: Table,
}

impl Matches {
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.num_rows()
    }

    /// `true` is the explicit "no results" signal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Output of [`TableFilter::describe`].
#[derive(Clone, Debug)]
pub struct Summary {
    pub rows: usize,
    pub columns: Vec<String>,
    /// The first `limit` rows.
    pub preview: Table,
}

/// An artifact loaded fully into memory, plus the queries over it.
#[derive(Clone, Debug)]
pub struct TableFilter {
    table: Table,
}

impl TableFilter {
    /// Load the artifact at `path`.
    ///
    /// # Errors
    /// Returns an error if the file is missing or not a readable Parquet artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = read_table(path).with_context(|| format!("load {}", path.display()))?;
        debug!(
            path = %path.display(),
            rows = table.num_rows(),
            columns = table.num_columns(),
            "loaded artifact"
        );
        Ok(Self::from_table(table))
    }

    /// Wrap an already-loaded table.
    #[must_use]
    pub fn from_table(table: Table) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn describe(&self, limit: usize) -> Summary {
        Summary {
            rows: self.table.num_rows(),
            columns: self.column_names(),
            preview: self.table.head(limit),
        }
    }

    /// Rows whose `column` equals `value` exactly.
    ///
    /// # Errors
    /// [`FilterError::ColumnNotFound`] if `column` is not in the schema.
    pub fn filter_exact(&self, column: &str, value: &str) -> Result<Matches, FilterError> {
        self.run(Query::Exact {
            column: column.to_string(),
            value: value.to_string(),
        })
    }

    /// Rows whose `column` contains `needle`, compared case-insensitively.
    ///
    /// # Errors
    /// [`FilterError::ColumnNotFound`] if `column` is not in the schema.
    pub fn filter_contains(&self, column: &str, needle: &str) -> Result<Matches, FilterError> {
        self.run(Query::Contains {
            column: column.to_string(),
            needle: needle.to_string(),
        })
    }

    /// Evaluate `query` against the whole table.
    ///
    /// # Errors
    /// See [`TableFilter::filter_exact`].
    pub fn run(&self, query: Query) -> Result<Matches, FilterError> {
        let idx = self
            .table
            .column_index(query.column())
            .ok_or_else(|| FilterError::ColumnNotFound {
                column: query.column().to_string(),
                available: self.column_names(),
            })?;

        let rows = match &query {
            Query::Exact { value, .. } => {
                let scalar = StringArray::new_scalar(value.as_str());
                self.select_on(idx, |col| Ok(eq(col, &scalar)?))?
            }
            Query::Contains { needle, .. } => {
                let needle = needle.to_lowercase();
                self.select_on(idx, |col| Ok(contains_ignore_case(col, &needle)))?
            }
        };
        Ok(Matches { query, rows })
    }

    fn select_on<F>(&self, idx: usize, mut mask_fn: F) -> Result<Table, FilterError>
    where
        F: FnMut(&ArrayRef) -> Result<BooleanArray, FilterError>,
    {
        self.table
            .select(|batch: &RecordBatch| mask_fn(&text_column(batch.column(idx))?))
    }

    fn column_names(&self) -> Vec<String> {
        self.table
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

fn text_column(col: &ArrayRef) -> Result<ArrayRef, ArrowError> {
    if col.data_type() == &DataType::Utf8 {
        Ok(col.clone())
    } else {
        cast(col, &DataType::Utf8)
    }
}

/// `needle` must already be lowercase.
fn contains_ignore_case(col: &ArrayRef, needle: &str) -> BooleanArray {
    col.as_string::<i32>()
        .iter()
        .map(|cell| Some(cell.is_some_and(|s| s.to_lowercase().contains(needle))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn people() -> TableFilter {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, true),
            Field::new("name", DataType::Utf8, true),
        ]));
        let ids: ArrayRef = Arc::new(StringArray::from(vec![Some("1"), Some("2"), Some("3"), Some("4")]));
        let names: ArrayRef = Arc::new(StringArray::from(vec![
            Some("Alice"),
            Some("bob smith"),
            Some("Carol"),
            None,
        ]));
        let batch = RecordBatch::try_new(schema.clone(), vec![ids, names]).expect("valid batch");
        TableFilter::from_table(Table::new(schema, vec![batch]).expect("valid table"))
    }

    #[test]
    fn exact_is_case_sensitive() -> Result<()> {
        let f = people();
        assert_eq!(f.filter_exact("name", "Alice")?.count(), 1);
        assert!(f.filter_exact("name", "alice")?.is_empty());
        Ok(())
    }

    #[test]
    fn contains_ignores_case_and_skips_nulls() -> Result<()> {
        let f = people();
        let m = f.filter_contains("name", "SMITH")?;
        assert_eq!(m.count(), 1);
        let ids = m.rows.batches()[0].column(0).as_string::<i32>().value(0).to_string();
        assert_eq!(ids, "2");
        // "" is in every string but nulls still never match
        assert_eq!(f.filter_contains("name", "")?.count(), 3);
        Ok(())
    }

    #[test]
    fn unknown_column_lists_available() {
        let err = people().filter_exact("nonexistent_col", "x").unwrap_err();
        match err {
            FilterError::ColumnNotFound { column, available } => {
                assert_eq!(column, "nonexistent_col");
                assert_eq!(available, vec!["id", "name"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn describe_limits_preview() {
        let s = people().describe(2);
        assert_eq!(s.rows, 4);
        assert_eq!(s.columns, vec!["id", "name"]);
        assert_eq!(s.preview.num_rows(), 2);
    }

    #[test]
    fn query_display_matches_report_lines() {
        let q = Query::Contains {
            column: "name".into(),
            needle: "smith".into(),
        };
        assert_eq!(q.to_string(), "Contains search for name containing 'smith'");
    }
}
