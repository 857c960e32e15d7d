//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! The [`Hasher`] reads a file through a fixed-size buffer and folds every
//! chunk into a running BLAKE3 digest, so memory use does not depend on the
//! file size. The fingerprint is the lowercase hexadecimal form of the digest.
//! It is used as a content identity for grouping, not as a security boundary.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let record = hasher.hash_file(Path::new("Cargo.toml")).unwrap();
//! println!("{} {}", record.fingerprint, record.path.display());
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{FileRecord, HashError};

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Number of trailing fingerprint characters shown in the text report.
pub const SHORT_FINGERPRINT_LEN: usize = 7;

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Use a different read buffer size. Zero is bumped to one byte.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Set the shutdown flag checked between chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Read buffer size in bytes.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the whole file at `path` and wrap the result in a [`FileRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, a read fails
    /// mid-stream, or shutdown is requested before the last chunk.
    pub fn hash_file(&self, path: &Path) -> Result<FileRecord, HashError> {
        let (fingerprint, size) = self.digest(path)?;
        Ok(FileRecord::new(fingerprint, path.to_path_buf(), size))
    }

    /// Compute only the fingerprint of the file at `path`.
    ///
    /// # Errors
    ///
    /// Same as [`Hasher::hash_file`].
    pub fn fingerprint(&self, path: &Path) -> Result<String, HashError> {
        self.digest(path).map(|(fingerprint, _)| fingerprint)
    }

    fn digest(&self, path: &Path) -> Result<(String, u64), HashError> {
        let mut file =
            File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total: u64 = 0;

        loop {
            if self.is_shutdown_requested() {
                log::trace!("Hasher: shutdown requested while reading {}", path.display());
                return Err(HashError::Interrupted(path.to_path_buf()));
            }

            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path.to_path_buf(), e)),
            };

            hasher.update(&buffer[..read]);
            total += read as u64;
        }

        Ok((hasher.finalize().to_hex().to_string(), total))
    }
}

/// Trailing `len` characters of a fingerprint.
///
/// Returns the whole fingerprint when it is shorter than `len`.
///
/// # Examples
///
/// ```
/// use dupscan::scanner::short_fingerprint;
///
/// assert_eq!(short_fingerprint("0123456789abcdef", 7), "9abcdef");
/// assert_eq!(short_fingerprint("abc", 7), "abc");
/// ```
#[must_use]
pub fn short_fingerprint(fingerprint: &str, len: usize) -> &str {
    let start = fingerprint.len().saturating_sub(len);
    fingerprint.get(start..).unwrap_or(fingerprint)
}
