//! # parkstats command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize tracing (stderr + rolling files)
//!   └─> Run the subcommand: clean | summarise | analyse
//! ```
//!
//! ```bash
//! parkstats clean --parks parks.csv --species species.csv -o merged.csv
//! parkstats analyse --parks parks.csv --species species.csv --seed 42 --parallel
//! ```

#![expect(clippy::print_stdout)] // JSON results go to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;
use parkstats::logging::{self, LogOptions};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    logging::init(&LogOptions {
        default_filter: cli.log_level.clone(),
        file_logging: !cli.no_log_files,
    })?;

    if let Err(err) = cli::run_command(cli.command) {
        tracing::error!("{err:#}");
        return Err(err);
    }
    Ok(())
}
