use anyhow::Result;
use ironchunk::config::ConvertConfig;
use ironchunk::convert::ChunkedConverter;
use ironchunk::filter::{FilterError, Query, TableFilter};
use ironchunk::testing::*;
use std::path::{Path, PathBuf};

fn converted(dir: &Path, contents: &str, chunk_size: usize) -> Result<PathBuf> {
    let source = write_csv_fixture(dir, "source.csv", contents)?;
    let cfg = ConvertConfig::new(&source, dir.join("out.parquet"))
        .with_scratch_dir(dir.join("temp_chunks"))
        .with_chunk_size(chunk_size);
    ChunkedConverter::new(cfg.clone()).run()?;
    Ok(cfg.destination)
}

#[test]
fn queries_over_a_converted_artifact() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let artifact = converted(tmp.path(), PEOPLE_CSV, 2)?;
    let filter = TableFilter::load(&artifact)?;

    let hits = filter.filter_contains("name", "SMITH")?;
    assert_eq!(hits.count(), 1);
    assert_column_eq(&hits.rows, "id", &[Some("2")]);
    assert_column_eq(&hits.rows, "name", &[Some("bob smith")]);

    assert!(filter.filter_exact("name", "Dave")?.is_empty());
    assert!(filter.filter_exact("name", "alice")?.is_empty());
    assert_eq!(filter.filter_exact("name", "Alice")?.count(), 1);
    Ok(())
}

#[test]
fn unknown_column_lists_what_exists() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let artifact = converted(tmp.path(), PEOPLE_CSV, 10)?;
    let filter = TableFilter::load(&artifact)?;

    match filter.filter_exact("nonexistent_col", "x") {
        Err(FilterError::ColumnNotFound { column, available }) => {
            assert_eq!(column, "nonexistent_col");
            assert_eq!(available, vec!["id".to_string(), "name".to_string()]);
        }
        other => panic!("expected ColumnNotFound, got {other:?}"),
    }
    // the table is still usable afterwards
    assert_eq!(filter.filter_contains("name", "o")?.count(), 2);
    Ok(())
}

#[test]
fn matches_span_chunk_boundaries_in_source_order() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let artifact = converted(tmp.path(), &payments_csv(200), 17)?;
    let filter = TableFilter::load(&artifact)?;

    let hits = filter.filter_contains("note", "TRAVEL")?;
    assert_eq!(hits.count(), 40);
    let ids = column_values(&hits.rows, "record_id");
    let expected: Vec<Option<String>> = (1..=200)
        .filter(|i| i % 5 == 0)
        .map(|i| Some(format!("{i:06}")))
        .collect();
    assert_eq!(ids, expected);

    let exact = filter.run(Query::Exact {
        column: "recipient".into(),
        value: "Recipient 0".into(),
    })?;
    assert_eq!(exact.count(), 200 / 13);
    Ok(())
}

#[test]
fn missing_amounts_never_match() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let artifact = converted(tmp.path(), &payments_csv(70), 25)?;
    let filter = TableFilter::load(&artifact)?;

    // every non-empty amount contains a '.', the 10 empty ones are missing
    assert_eq!(filter.filter_contains("amount", ".")?.count(), 60);
    assert_eq!(filter.filter_contains("amount", "")?.count(), 60);
    assert!(filter.filter_exact("amount", "")?.is_empty());
    Ok(())
}

#[test]
fn describe_reports_shape_and_preview() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let artifact = converted(tmp.path(), &payments_csv(30), 8)?;
    let filter = TableFilter::load(&artifact)?;

    let summary = filter.describe(10);
    assert_eq!(summary.rows, 30);
    assert_eq!(
        summary.columns,
        vec!["record_id", "recipient", "amount", "paid_on", "note"]
    );
    assert_eq!(summary.preview.num_rows(), 10);
    let rendered = summary.preview.render()?;
    assert!(rendered.contains("000010"));
    assert!(!rendered.contains("000011"));
    Ok(())
}

#[test]
fn loading_a_missing_artifact_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    assert!(TableFilter::load(tmp.path().join("nope.parquet")).is_err());
}
