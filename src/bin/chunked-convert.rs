//! Convert the configured CSV export into a single Parquet artifact.
//!
//! Takes no arguments; see [`ConvertConfig::default`] for the paths and chunk size.

use ironchunk::config::ConvertConfig;
use ironchunk::convert::{ChunkedConverter, ConversionFailed};
use ironchunk::logging::init_tracing;
use ironchunk::utils::group_thousands;

fn main() {
    init_tracing();
    let config = ConvertConfig::default();

    println!(
        "Starting conversion of {} to {}",
        config.source.display(),
        config.destination.display()
    );
    println!(
        "Processing in chunks of {} rows",
        group_thousands(config.chunk_size as u64)
    );

    match ChunkedConverter::new(config).run() {
        Ok(report) => report.print(),
        Err(err) => {
            eprintln!("Error during conversion: {err:#}");
            eprintln!("Try reducing the chunk_size if you're still running out of memory");
            if let Some(failed) = err.downcast_ref::<ConversionFailed>() {
                for leftover in &failed.cleanup.failed {
                    eprintln!("  left behind: {} ({})", leftover.path.display(), leftover.reason);
                }
            }
        }
    }
}
