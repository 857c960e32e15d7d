//! Fan-in aggregation of scan events.
//!
//! The [`Aggregator`] is the single owner of the [`Grouping`] while a scan
//! runs. Every walker and hash task holds a sender of the same channel; the
//! aggregator drains it on a dedicated thread and finishes when the last
//! sender is dropped. No lock guards the map because nothing else touches it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use super::finder::FinderError;
use super::groups::Grouping;
use crate::progress::ProgressCallback;
use crate::scanner::{Diagnostic, ScanEvent};

/// Everything the aggregator collected during one scan.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    /// Fingerprint groups
    pub grouping: Grouping,
    /// Skipped files and subtrees, in arrival order
    pub diagnostics: Vec<Diagnostic>,
    /// Number of directories listed
    pub directories: usize,
    /// Total bytes fed into fingerprints
    pub bytes_hashed: u64,
}

/// Single consumer of the scan event channel.
pub struct Aggregator {
    receiver: Receiver<ScanEvent>,
    abort_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("abort_flag", &self.abort_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Aggregator {
    /// Create an aggregator draining `receiver`.
    #[must_use]
    pub fn new(receiver: Receiver<ScanEvent>) -> Self {
        Self {
            receiver,
            abort_flag: None,
            progress_callback: None,
        }
    }

    /// Trip `flag` on the first skipped item (fail-fast runs).
    #[must_use]
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort_flag = Some(flag);
        self
    }

    /// Forward events to a progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Drain the channel on the current thread until every sender is gone.
    #[must_use]
    pub fn run(self) -> Aggregate {
        let mut aggregate = Aggregate::default();

        for event in self.receiver.iter() {
            match event {
                ScanEvent::Record(record) => {
                    if let Some(ref cb) = self.progress_callback {
                        cb.on_file_hashed(&record.path, record.size);
                    }
                    aggregate.bytes_hashed += record.size;
                    aggregate.grouping.insert(record);
                }
                ScanEvent::Directory(path) => {
                    if let Some(ref cb) = self.progress_callback {
                        cb.on_directory(&path);
                    }
                    aggregate.directories += 1;
                }
                ScanEvent::Skipped(diagnostic) => {
                    if let Some(ref flag) = self.abort_flag {
                        if !flag.swap(true, Ordering::SeqCst) {
                            log::debug!("Aborting scan after: {}", diagnostic);
                        }
                    }
                    if let Some(ref cb) = self.progress_callback {
                        cb.on_skipped(&diagnostic);
                    }
                    aggregate.diagnostics.push(diagnostic);
                }
            }
        }

        log::debug!(
            "Aggregator finished: {} files in {} groups, {} skipped",
            aggregate.grouping.total_files(),
            aggregate.grouping.len(),
            aggregate.diagnostics.len()
        );
        aggregate
    }

    /// Run the aggregator on its own thread.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Io`] if the thread cannot be spawned.
    pub fn spawn(self) -> Result<AggregatorHandle, FinderError> {
        let handle = thread::Builder::new()
            .name("dupscan-aggregator".to_string())
            .spawn(move || self.run())?;
        Ok(AggregatorHandle { handle })
    }
}

/// Handle to a running aggregator.
#[derive(Debug)]
pub struct AggregatorHandle {
    handle: JoinHandle<Aggregate>,
}

impl AggregatorHandle {
    /// Wait for the aggregator to finish and take its result.
    ///
    /// Only returns once every sender of the event channel has been dropped.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Aggregator`] if the aggregator thread panicked.
    pub fn join(self) -> Result<Aggregate, FinderError> {
        self.handle.join().map_err(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            FinderError::Aggregator(message)
        })
    }
}
