//! JSON output formatter for scan reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "fingerprint": "af1349b9...",
//!       "count": 2,
//!       "files": ["/data/a.txt", "/data/b/b.txt"]
//!     }
//!   ],
//!   "skipped": [
//!     { "kind": "traversal", "path": "/data/locked", "message": "Permission denied: /data/locked" }
//!   ],
//!   "summary": {
//!     "files_hashed": 3,
//!     "bytes_hashed": 3,
//!     "directories": 2,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "skipped_subtrees": 1,
//!     "skipped_files": 0,
//!     "scan_duration_ms": 12,
//!     "exit_code": 0,
//!     "exit_code_name": "DS000"
//!   },
//!   "started_at": "2024-01-01T00:00:00Z"
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanReport, ScanSummary};
use crate::error::ExitCode;
use crate::scanner::Diagnostic;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 fingerprint as hexadecimal string (64 characters)
    pub fingerprint: String,
    /// Number of files sharing the fingerprint
    pub count: usize,
    /// Paths in arrival order
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            fingerprint: group.fingerprint.clone(),
            count: group.len(),
            files: group
                .paths
                .iter()
                .map(|p| normalize_path(p.as_path()))
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Number of files hashed
    pub files_hashed: usize,
    /// Total bytes read while hashing
    pub bytes_hashed: u64,
    /// Number of directories listed
    pub directories: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Number of redundant copies
    pub duplicate_files: usize,
    /// Directories whose subtree was skipped
    pub skipped_subtrees: usize,
    /// Files that could not be hashed
    pub skipped_files: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            files_hashed: summary.files_hashed,
            bytes_hashed: summary.bytes_hashed,
            directories: summary.directories,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            skipped_subtrees: summary.skipped_subtrees(),
            skipped_files: summary.skipped_files(),
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Groups with two or more files, largest first
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Files and subtrees that could not be read
    pub skipped: Vec<Diagnostic>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// When the scan started
    pub started_at: DateTime<Utc>,
}

impl JsonOutput {
    /// Build the JSON document for a finished scan.
    ///
    /// # Example
    ///
    /// ```
    /// use dupscan::duplicates::{Grouping, ScanReport, ScanSummary};
    /// use dupscan::error::ExitCode;
    /// use dupscan::output::JsonOutput;
    ///
    /// let report = ScanReport { grouping: Grouping::new(), summary: ScanSummary::default() };
    /// let output = JsonOutput::new(&report, chrono::Utc::now(), ExitCode::Success);
    /// assert!(output.duplicates.is_empty());
    /// ```
    #[must_use]
    pub fn new(report: &ScanReport, started_at: DateTime<Utc>, exit_code: ExitCode) -> Self {
        Self {
            duplicates: report
                .grouping
                .duplicate_groups()
                .iter()
                .map(JsonDuplicateGroup::from)
                .collect(),
            skipped: report.summary.skipped.clone(),
            summary: JsonSummary::from_scan_summary(&report.summary, exit_code),
            started_at,
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Absolute path string, or the path as given if it no longer resolves.
fn normalize_path(path: &std::path::Path) -> String {
    match path.canonicalize() {
        Ok(canonical) => canonical.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
