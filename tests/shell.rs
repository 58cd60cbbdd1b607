use anyhow::Result;
use ironchunk::config::{ConvertConfig, SearchConfig};
use ironchunk::convert::ChunkedConverter;
use ironchunk::shell::{Command, USAGE_HINT, run_batch, run_interactive, write_usage};
use ironchunk::testing::*;
use std::io::Cursor;
use std::path::Path;

fn people_artifact(dir: &Path) -> Result<SearchConfig> {
    let source = write_csv_fixture(dir, "people.csv", PEOPLE_CSV)?;
    let cfg = ConvertConfig::new(&source, dir.join("people.parquet"))
        .with_scratch_dir(dir.join("temp_chunks"))
        .with_chunk_size(2);
    ChunkedConverter::new(cfg.clone()).run()?;
    Ok(SearchConfig::new(cfg.destination))
}

fn batch(config: &SearchConfig, line: &str) -> Result<String> {
    let command = Command::parse_line(line).expect("well-formed command");
    let mut out = Vec::new();
    run_batch(config, &command, &mut out)?;
    Ok(String::from_utf8(out)?)
}

fn session(config: &SearchConfig, input: &str) -> Result<String> {
    let mut out = Vec::new();
    run_interactive(config, Cursor::new(input.to_string()), &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn batch_info_lists_columns_and_preview() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = people_artifact(tmp.path())?;
    let out = batch(&config, "info")?;

    assert!(out.starts_with("Loading parquet file: "));
    assert!(out.contains("Total rows: 3\n"));
    assert!(out.contains("Total columns: 2\n"));
    assert!(out.contains(" 1. id\n"));
    assert!(out.contains(" 2. name\n"));
    assert!(out.contains("First 10 rows:"));
    assert!(out.contains("bob smith"));
    Ok(())
}

#[test]
fn batch_contains_is_case_insensitive() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = people_artifact(tmp.path())?;
    let out = batch(&config, "contains name SMITH")?;

    assert!(out.contains("Contains search for name containing 'SMITH': 1 rows"));
    assert!(out.contains("First 1 results:"));
    assert!(out.contains("bob smith"));
    assert!(!out.contains("Alice"));
    Ok(())
}

#[test]
fn batch_exact_with_no_hits() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = people_artifact(tmp.path())?;
    let out = batch(&config, "search name Dave")?;

    assert!(out.contains("Exact match for name = 'Dave': 0 rows"));
    assert!(out.contains("No results found!"));
    Ok(())
}

#[test]
fn batch_exact_rejoins_multi_word_values() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = people_artifact(tmp.path())?;
    let out = batch(&config, "search name bob smith")?;

    assert!(out.contains("Exact match for name = 'bob smith': 1 rows"));
    Ok(())
}

#[test]
fn batch_unknown_column_prints_available() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = people_artifact(tmp.path())?;
    let out = batch(&config, "search nonexistent_col x")?;

    assert!(out.contains("Error: Column 'nonexistent_col' not found!"));
    assert!(out.contains("Available columns:\n  - id\n  - name\n"));
    Ok(())
}

#[test]
fn batch_missing_artifact_is_reported() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = SearchConfig::new(tmp.path().join("absent.parquet"));
    let out = batch(&config, "info")?;

    assert!(out.contains("Error: "));
    assert!(!out.contains("Total rows"));
    Ok(())
}

#[test]
fn interactive_session_runs_until_exit() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = people_artifact(tmp.path())?;
    let out = session(
        &config,
        "contains name SMITH\nfrobnicate\nsearch nonexistent_col x\nexit\ninfo\n",
    )?;

    assert!(out.starts_with("=== Parquet Data Search Tool ==="));
    assert!(out.contains("Loaded: 3 rows, 2 columns"));
    assert!(out.contains("containing 'SMITH': 1 rows"));
    assert!(out.contains(USAGE_HINT));
    assert!(out.contains("Column 'nonexistent_col' not found!"));
    // nothing after exit is executed
    assert!(!out.contains("Column names:"));
    assert_eq!(out.matches("Enter command: ").count(), 4);
    assert!(out.trim_end().ends_with("Goodbye!"));
    Ok(())
}

#[test]
fn interactive_session_ends_on_blank_line_or_eof() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = people_artifact(tmp.path())?;

    let blank = session(&config, "info\n\nsearch id 1\n")?;
    assert!(blank.contains("Column names:"));
    assert!(!blank.contains("Exact match"));
    assert!(blank.trim_end().ends_with("Goodbye!"));

    let eof = session(&config, "search id 1")?;
    assert!(eof.contains("Exact match for id = '1': 1 rows"));
    assert!(eof.trim_end().ends_with("Goodbye!"));
    Ok(())
}

#[test]
fn interactive_session_survives_undecodable_input() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = people_artifact(tmp.path())?;

    let mut input = b"search name \xff\xfe\n".to_vec();
    input.extend_from_slice(b"contains name SMITH\nexit\n");
    let mut out = Vec::new();
    run_interactive(&config, Cursor::new(input), &mut out)?;
    let out = String::from_utf8(out)?;

    assert!(out.contains("Error: command is not valid UTF-8"));
    assert!(out.contains("containing 'SMITH': 1 rows"));
    assert_eq!(out.matches("Enter command: ").count(), 3);
    assert!(out.trim_end().ends_with("Goodbye!"));
    Ok(())
}

#[test]
fn interactive_load_failure_ends_session() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = SearchConfig::new(tmp.path().join("absent.parquet"));
    let out = session(&config, "info\n")?;

    assert!(out.contains("Error loading file:"));
    assert!(!out.contains("Enter command: "));
    Ok(())
}

#[test]
fn usage_names_every_command() -> Result<()> {
    let mut out = Vec::new();
    write_usage("table-search", &mut out)?;
    let text = String::from_utf8(out)?;
    for shape in ["info", "search <column> <value>", "contains <column> <text>"] {
        assert!(text.contains(&format!("table-search {shape}")), "{shape}");
    }
    Ok(())
}
