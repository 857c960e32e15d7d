//! Output formatters for scan reports.
//!
//! - Text for terminals (the default)
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::DuplicateFinder;
//! use dupscan::output::TextOutput;
//! use std::path::Path;
//!
//! let report = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! print!("{}", TextOutput::new(&report).render());
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use text::{format_elapsed, TextOutput};
