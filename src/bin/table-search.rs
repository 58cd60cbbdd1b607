//! Query a Parquet artifact by column value.
//!
//! ```text
//! table-search                              interactive mode
//! table-search info                         summary and preview
//! table-search search <column> <value...>   exact match
//! table-search contains <column> <text...>  case-insensitive substring match
//! ```

use anyhow::Result;
use ironchunk::config::SearchConfig;
use ironchunk::logging::init_tracing;
use ironchunk::shell::{Invocation, parse_args, run_batch, run_interactive, write_usage};
use std::io::{self, Write};

fn main() -> Result<()> {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = SearchConfig::default();
    let mut out = io::stdout().lock();

    match parse_args(&args) {
        Invocation::Interactive => run_interactive(&config, io::stdin().lock(), &mut out)?,
        Invocation::Batch(command) => run_batch(&config, &command, &mut out)?,
        Invocation::Usage => write_usage("table-search", &mut out)?,
    }
    out.flush()?;
    Ok(())
}
