//! Assertions over [`Table`] contents.

use crate::table::Table;
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;

/// Values of `column` across all batches, as text, in row order.
///
/// # Panics
/// Panics if the column does not exist or cannot be cast to text.
#[must_use]
pub fn column_values(table: &Table, column: &str) -> Vec<Option<String>> {
    let idx = table
        .column_index(column)
        .unwrap_or_else(|| panic!("column '{column}' not in {:?}", table.column_names()));
    let mut out = Vec::with_capacity(table.num_rows());
    for batch in table.batches() {
        let text = cast(batch.column(idx), &DataType::Utf8).expect("cast column to text");
        let strings = text.as_string::<i32>();
        out.extend((0..strings.len()).map(|i| {
            (!strings.is_null(i)).then(|| strings.value(i).to_string())
        }));
    }
    out
}

/// Assert that `column` holds exactly `expected`, in order.
///
/// # Panics
/// Panics on the first mismatch, showing both sequences.
pub fn assert_column_eq(table: &Table, column: &str, expected: &[Option<&str>]) {
    let actual = column_values(table, column);
    let expected: Vec<Option<String>> = expected.iter().map(|v| v.map(str::to_string)).collect();
    assert_eq!(
        actual, expected,
        "column '{column}' mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
}
