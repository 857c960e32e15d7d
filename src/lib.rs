//! dupscan - concurrent duplicate file finder
//!
//! Walks a directory tree with one task per directory and per file, bounds
//! in-flight I/O with a shared admission pool, and folds BLAKE3 fingerprints
//! into groups on a single aggregator thread.

pub mod cli;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run a scan for the parsed command line and print its report.
///
/// # Errors
///
/// Returns the scan's [`FinderError`](duplicates::FinderError) (wrapped)
/// when the root is invalid, the scan is interrupted or aborted, or the
/// report cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;

    let mut config = cli.finder_config().with_shutdown_flag(handler.get_flag());
    if cli.show_progress() {
        config = config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(config);
    let started_at = chrono::Utc::now();
    let report = finder.find_duplicates(&cli.path)?;

    let stdout = io::stdout();
    let color = !cli.no_color && stdout.is_terminal();
    let mut out = stdout.lock();

    match cli.output {
        OutputFormat::Text => TextOutput::new(&report)
            .with_all_paths(cli.all)
            .with_color(color)
            .write_to(&mut out)
            .context("Failed to write report")?,
        OutputFormat::Json => JsonOutput::new(&report, started_at, ExitCode::Success)
            .write_to(&mut out, true)
            .context("Failed to write JSON report")?,
    }
    out.flush().context("Failed to flush report")?;

    Ok(ExitCode::Success)
}
