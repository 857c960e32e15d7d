//! Command-line interface definitions for dupscan.
//!
//! # Example
//!
//! ```bash
//! # Scan a directory, print one representative path per duplicate group
//! dupscan ~/Downloads
//!
//! # JSON report for scripting
//! dupscan ~/Downloads --output json
//!
//! # Cap in-flight reads at 4 and stop at the first unreadable entry
//! dupscan --workers 4 --strict ~/Downloads
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::duplicates::{ErrorPolicy, FinderConfig, ScanStrategy};

/// Concurrent duplicate file finder.
///
/// Walks a directory tree, fingerprints every regular non-empty file with
/// BLAKE3 and reports files sharing content.
#[derive(Debug, Parser)]
#[command(name = "dupscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress everything except the report and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Maximum concurrent directory listings and file reads
    /// (default: twice the worker threads)
    #[arg(long, value_name = "N", env = "DUPSCAN_WORKERS", value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Minimum worker threads in the scan pool; the pool grows to match
    /// --workers (default: available parallelism)
    #[arg(long, value_name = "N", env = "DUPSCAN_THREADS", value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: Option<u32>,

    /// Abort on the first unreadable file or directory instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Walk the tree on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Print every path of each duplicate group
    #[arg(short, long)]
    pub all: bool,

    /// Hide the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// Finder configuration for these flags.
    ///
    /// Shutdown flag and progress reporting are attached by the caller.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        let mut config = FinderConfig::default();
        if let Some(threads) = self.threads {
            config = config.with_threads(threads as usize);
            config = config.with_admission_capacity(2 * threads as usize);
        }
        if let Some(workers) = self.workers {
            config = config.with_admission_capacity(workers as usize);
        }
        if self.strict {
            config = config.with_error_policy(ErrorPolicy::Abort);
        }
        if self.sequential {
            config = config.with_strategy(ScanStrategy::Sequential);
        }
        config
    }

    /// Whether the progress spinner should be drawn.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !(self.quiet || self.no_progress || self.output == OutputFormat::Json)
    }
}

/// Output format for scan reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
