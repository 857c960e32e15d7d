//! Progress reporting utilities using indicatif.
//!
//! The aggregator is the only component that sees every scan event, so it
//! drives a [`ProgressCallback`]. [`Progress`] renders those callbacks as a
//! single spinner with running counts.

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::scanner::Diagnostic;

/// Progress callback for scan events.
///
/// Implement this trait to receive progress updates while a scan runs.
/// Callbacks come from the aggregator thread, one at a time.
pub trait ProgressCallback: Send + Sync {
    /// Called once before any task is spawned.
    fn on_scan_start(&self, root: &Path);

    /// Called for each directory listed.
    fn on_directory(&self, _path: &Path) {}

    /// Called for each file hashed, with the number of bytes read.
    fn on_file_hashed(&self, _path: &Path, _bytes: u64) {}

    /// Called for each skipped file or subtree.
    fn on_skipped(&self, _diagnostic: &Diagnostic) {}

    /// Called once after the last event.
    fn on_scan_end(&self);
}

/// Spinner showing directories, files and bytes processed so far.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    directories: AtomicUsize,
    files: AtomicUsize,
    bytes: AtomicU64,
    skipped: AtomicUsize,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupscan::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            directories: AtomicUsize::new(0),
            files: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
            skipped: AtomicUsize::new(0),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn message(&self) -> String {
        let mut msg = format!(
            "{} dirs, {} files, {}",
            self.directories.load(Ordering::Relaxed),
            self.files.load(Ordering::Relaxed),
            ByteSize::b(self.bytes.load(Ordering::Relaxed)),
        );
        let skipped = self.skipped.load(Ordering::Relaxed);
        if skipped > 0 {
            msg.push_str(&format!(", {} skipped", skipped));
        }
        msg
    }

    fn refresh(&self) {
        if self.quiet {
            return;
        }
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref pb) = *guard {
                pb.set_message(self.message());
            }
        }
    }

    /// Number of files reported as hashed so far.
    #[must_use]
    pub fn files_hashed(&self) -> usize {
        self.files.load(Ordering::Relaxed)
    }
}

impl ProgressCallback for Progress {
    fn on_scan_start(&self, root: &Path) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::style());
        pb.set_message(format!("Scanning {}", root.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_directory(&self, _path: &Path) {
        self.directories.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    fn on_file_hashed(&self, _path: &Path, bytes: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.refresh();
    }

    fn on_skipped(&self, _diagnostic: &Diagnostic) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    fn on_scan_end(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}
