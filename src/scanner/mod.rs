//! Scanner module for concurrent directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Concurrent directory walking, one task per directory
//! - Streaming content fingerprints with BLAKE3
//! - Admission control shared by every traversal and hashing task
//! - Outstanding-work tracking used as the scan's termination signal
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`admission`]: Counting semaphore bounding in-flight operations
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//! - [`tracker`]: Outstanding-work counter
//! - [`walker`]: Directory fan-out and the sequential baseline walk
//!
//! Every task reports through a single [`ScanEvent`] stream. Failures are
//! events too, so the coordinator decides whether they abort the run.

pub mod admission;
pub mod hasher;
pub mod tracker;
pub mod walker;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

// Re-export main types
pub use admission::{AdmissionController, AdmissionToken};
pub use hasher::{short_fingerprint, Hasher, DEFAULT_BUFFER_SIZE, SHORT_FINGERPRINT_LEN};
pub use tracker::{WorkGuard, WorkTracker};
pub use walker::{ScanContext, SequentialWalker};

/// Fingerprint of one successfully hashed file.
///
/// Produced once per file by a hash task and consumed exactly once by the
/// aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Lowercase hexadecimal BLAKE3 digest of the file content
    pub fingerprint: String,
    /// Path of the hashed file
    pub path: PathBuf,
    /// Number of bytes fed into the digest
    pub size: u64,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(fingerprint: String, path: PathBuf, size: u64) -> Self {
        Self {
            fingerprint,
            path,
            size,
        }
    }
}

/// What kind of work a [`Diagnostic`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// A directory could not be listed; its whole subtree was skipped.
    Traversal,
    /// A file could not be opened or fully read.
    Hash,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Traversal => write!(f, "traversal"),
            DiagnosticKind::Hash => write!(f, "hash"),
        }
    }
}

/// A non-fatal failure recorded during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Whether a subtree or a single file was skipped
    pub kind: DiagnosticKind,
    /// Path that could not be processed
    pub path: PathBuf,
    /// Human-readable reason
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic for a directory that could not be listed.
    #[must_use]
    pub fn traversal(error: &ScanError) -> Self {
        Self {
            kind: DiagnosticKind::Traversal,
            path: error.path().to_path_buf(),
            message: error.to_string(),
        }
    }

    /// Diagnostic for a file that could not be hashed.
    #[must_use]
    pub fn hash(path: PathBuf, error: &HashError) -> Self {
        Self {
            kind: DiagnosticKind::Hash,
            path,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Message sent from scan tasks to the aggregator.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A file was hashed.
    Record(FileRecord),
    /// A directory was listed.
    Directory(PathBuf),
    /// A file or subtree was skipped.
    Skipped(Diagnostic),
}

/// Errors that can occur while listing a directory.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when listing a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The directory disappeared before it could be listed.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while listing a directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while listing `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// The directory this error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(path) | Self::NotFound(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}
