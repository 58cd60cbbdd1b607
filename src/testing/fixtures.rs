//! Synthetic source tables.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Three people, one of them with a two-word name.
pub const PEOPLE_CSV: &str = "id,name\n1,Alice\n2,bob smith\n3,Carol\n";

/// Write `contents` to `dir/name` and return the full path.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_csv_fixture(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("write fixture {}", path.display()))?;
    Ok(path)
}

/// A payments-style table with `rows` data rows.
///
/// Columns: `record_id`, `recipient`, `amount`, `paid_on`, `note`.
/// - `record_id` is zero-padded (`"000017"`), so any numeric coercion would show
/// - every 7th `amount` is empty
/// - every 5th `note` is quoted and contains a comma
#[must_use]
pub fn payments_csv(rows: usize) -> String {
    let mut out = String::from("record_id,recipient,amount,paid_on,note\n");
    for i in 1..=rows {
        let amount = if i % 7 == 0 {
            String::new()
        } else {
            format!("{}.{:02}", i * 3, i % 100)
        };
        let note = if i % 5 == 0 {
            format!("\"travel, lodging #{i}\"")
        } else {
            format!("food {i}")
        };
        let _ = writeln!(
            out,
            "{i:06},Recipient {},{amount},2023-{:02}-{:02},{note}",
            i % 13,
            i % 12 + 1,
            i % 28 + 1
        );
    }
    out
}

/// Gzip-compress `contents` into `dir/name`.
///
/// # Errors
/// Returns an error if the file cannot be written.
#[cfg(feature = "compression-gzip")]
pub fn write_gzip_fixture(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let path = dir.join(name);
    let file = fs::File::create(&path).with_context(|| format!("create {}", path.display()))?;
    let mut enc = GzEncoder::new(file, Compression::default());
    enc.write_all(contents.as_bytes())?;
    enc.finish()?;
    Ok(path)
}
