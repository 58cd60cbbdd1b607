//! Command front-end for [`TableFilter`].
//!
//! Commands are whitespace-separated tokens; values may span several tokens
//! and are rejoined with single spaces:
//!
//! ```text
//! info
//! search <column> <value...>     exact, case-sensitive
//! contains <column> <text...>    substring, case-insensitive
//! exit
//! ```
//!
//! [`run_batch`] loads the artifact and answers one command. [`run_interactive`]
//! loads it once and then reads commands until `exit`, a blank line, or end of
//! input. Both write to any [`Write`] so sessions can be driven from tests.

use crate::config::SearchConfig;
use crate::filter::{FilterError, Matches, Query, Summary, TableFilter};
use crate::utils::group_thousands;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Printed for an unrecognized interactive command.
pub const USAGE_HINT: &str =
    "Invalid command. Use: info, search <column> <value>, contains <column> <text>, or exit";

/// One parsed command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Info,
    Query(Query),
    Exit,
}

impl Command {
    /// Parse a tokenized command line. `None` means malformed (or empty).
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Option<Self> {
        let (head, rest) = tokens.split_first()?;
        let column_and_value = || {
            let (column, value) = rest.split_first()?;
            if value.is_empty() {
                return None;
            }
            let value = value.iter().map(AsRef::<str>::as_ref).collect::<Vec<_>>().join(" ");
            Some((column.as_ref().to_string(), value))
        };
        match head.as_ref() {
            "info" => Some(Self::Info),
            "exit" => Some(Self::Exit),
            "search" => {
                let (column, value) = column_and_value()?;
                Some(Self::Query(Query::Exact { column, value }))
            }
            "contains" => {
                let (column, needle) = column_and_value()?;
                Some(Self::Query(Query::Contains { column, needle }))
            }
            _ => None,
        }
    }

    /// Tokenize `line` on whitespace and parse it.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        Self::from_tokens(&tokens)
    }
}

/// What the `table-search` binary should do with its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    Interactive,
    Batch(Command),
    Usage,
}

/// Map program arguments (without the program name) to an [`Invocation`].
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Invocation {
    if args.is_empty() {
        return Invocation::Interactive;
    }
    match Command::from_tokens(args) {
        Some(Command::Exit) | None => Invocation::Usage,
        Some(command) => Invocation::Batch(command),
    }
}

/// Print the argument shapes `prog` accepts.
///
/// # Errors
/// Returns an error if `out` cannot be written.
pub fn write_usage<W: Write>(prog: &str, out: &mut W) -> Result<()> {
    writeln!(out, "Usage:")?;
    writeln!(out, "  {prog} - Interactive mode")?;
    writeln!(out, "  {prog} info - Show file info")?;
    writeln!(out, "  {prog} search <column> <value> - Exact search")?;
    writeln!(out, "  {prog} contains <column> <text> - Contains search")?;
    Ok(())
}

/// Print the table totals followed by the outcome of `command`.
///
/// A missing column is reported on `out` and is not an error.
///
/// # Errors
/// Returns an error if `out` cannot be written or the query fails to evaluate.
pub fn execute<W: Write>(
    filter: &TableFilter,
    command: &Command,
    limit: usize,
    out: &mut W,
) -> Result<()> {
    let table = filter.table();
    writeln!(out, "Total rows: {}", group_thousands(table.num_rows() as u64))?;
    writeln!(out, "Total columns: {}", table.num_columns())?;
    writeln!(out)?;

    match command {
        Command::Info => write_summary(&filter.describe(limit), limit, out),
        Command::Query(query) => match filter.run(query.clone()) {
            Ok(matches) => write_matches(&matches, limit, out),
            Err(FilterError::ColumnNotFound { column, available }) => {
                writeln!(out, "Error: Column '{column}' not found!")?;
                writeln!(out, "Available columns:")?;
                for name in available {
                    writeln!(out, "  - {name}")?;
                }
                Ok(())
            }
            Err(e) => Err(e).context("evaluate query"),
        },
        Command::Exit => Ok(()),
    }
}

fn write_summary<W: Write>(summary: &Summary, limit: usize, out: &mut W) -> Result<()> {
    writeln!(out, "Column names:")?;
    for (i, name) in summary.columns.iter().enumerate() {
        writeln!(out, "{:2}. {name}", i + 1)?;
    }
    writeln!(out)?;
    writeln!(out, "First {limit} rows:")?;
    writeln!(out, "{}", summary.preview.render()?)?;
    Ok(())
}

fn write_matches<W: Write>(matches: &Matches, limit: usize, out: &mut W) -> Result<()> {
    let count = matches.count();
    writeln!(
        out,
        "{}: {} rows",
        matches.query,
        group_thousands(count as u64)
    )?;
    if matches.is_empty() {
        writeln!(out, "No results found!")?;
    } else {
        writeln!(out, "\nFirst {} results:", limit.min(count))?;
        writeln!(out, "{}", matches.rows.head(limit).render()?)?;
    }
    Ok(())
}

/// Load the configured artifact and answer a single command.
///
/// Load failures and query failures are printed, not returned.
///
/// # Errors
/// Returns an error only if `out` cannot be written.
pub fn run_batch<W: Write>(config: &SearchConfig, command: &Command, out: &mut W) -> Result<()> {
    writeln!(out, "Loading parquet file: {}", config.artifact.display())?;
    let filter = match TableFilter::load(&config.artifact) {
        Ok(filter) => filter,
        Err(e) => {
            writeln!(out, "Error: {e:#}")?;
            return Ok(());
        }
    };
    if let Err(e) = execute(&filter, command, config.limit, out) {
        writeln!(out, "Error: {e:#}")?;
    }
    Ok(())
}

/// Print the banner, load the configured artifact once, then serve commands from `input`.
///
/// A load failure is printed and ends the session.
///
/// # Errors
/// Returns an error if `input` cannot be read or `out` cannot be written.
pub fn run_interactive<R: BufRead, W: Write>(
    config: &SearchConfig,
    input: R,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "=== Parquet Data Search Tool ===")?;
    writeln!(out, "Commands:")?;
    writeln!(out, "  info - Show basic info and column names")?;
    writeln!(out, "  search <column> <value> - Exact search")?;
    writeln!(out, "  contains <column> <text> - Text contains search")?;
    writeln!(out, "  exit - Quit")?;
    writeln!(out)?;

    let filter = match TableFilter::load(&config.artifact) {
        Ok(filter) => filter,
        Err(e) => {
            writeln!(out, "Error loading file: {e:#}")?;
            return Ok(());
        }
    };
    let table = filter.table();
    writeln!(
        out,
        "Loaded: {} rows, {} columns",
        group_thousands(table.num_rows() as u64),
        table.num_columns()
    )?;
    writeln!(out)?;

    command_loop(&filter, config.limit, input, out)?;
    writeln!(out, "Goodbye!")?;
    Ok(())
}

/// Prompt for and execute commands against an already-loaded `filter`.
///
/// A line that is not valid UTF-8 is reported and skipped.
///
/// # Errors
/// Returns an error if `input` cannot be read or `out` cannot be written.
pub fn command_loop<R: BufRead, W: Write>(
    filter: &TableFilter,
    limit: usize,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    let mut raw = Vec::new();
    loop {
        write!(out, "Enter command: ")?;
        out.flush()?;
        raw.clear();
        if input.read_until(b'\n', &mut raw).context("read command")? == 0 {
            writeln!(out)?;
            break;
        }
        let line = match std::str::from_utf8(&raw) {
            Ok(line) => line,
            Err(e) => {
                writeln!(out, "Error: command is not valid UTF-8: {e}")?;
                continue;
            }
        };
        if line.trim().is_empty() {
            break;
        }
        match Command::parse_line(line) {
            Some(Command::Exit) => break,
            Some(command) => {
                if let Err(e) = execute(filter, &command, limit, out) {
                    writeln!(out, "Error: {e:#}")?;
                }
            }
            None => writeln!(out, "{USAGE_HINT}")?,
        }
    }
    Ok(())
}
