//! Scan coordinator.
//!
//! # Overview
//!
//! [`DuplicateFinder`] owns the lifecycle of one scan:
//!
//! 1. Validate the root (usage errors surface before any task exists)
//! 2. Build the thread pool, admission pool, work tracker and event channel
//! 3. Start the aggregator, register the root and spawn its walker
//! 4. Wait for the outstanding-work counter to drain
//! 5. Close the coordinator's end of the channel and join the aggregator
//! 6. Apply the error policy to whatever was skipped
//!
//! The run moves through [`ScanState`] `Idle → Scanning → Draining → Done`.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_admission_capacity(8));
//! let report = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! for group in report.grouping.duplicate_groups() {
//!     println!("{} x{}", group.short_fingerprint(7), group.len());
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};

use super::aggregator::{Aggregate, Aggregator};
use super::groups::Grouping;
use crate::progress::ProgressCallback;
use crate::scanner::{
    AdmissionController, Diagnostic, DiagnosticKind, Hasher, ScanContext, ScanEvent,
    SequentialWalker, WorkTracker, DEFAULT_BUFFER_SIZE,
};

/// What to do when a file or subtree cannot be read mid-scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Record a diagnostic and keep scanning.
    #[default]
    Skip,
    /// Stop the scan at the first failure and discard partial results.
    Abort,
}

/// How the tree is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStrategy {
    /// One task per directory and per file on a thread pool.
    #[default]
    Concurrent,
    /// Single-threaded walk on the calling thread.
    Sequential,
}

/// Lifecycle of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No scan started yet.
    Idle,
    /// Tasks outstanding.
    Scanning,
    /// All tasks finished; the aggregator is consuming what is left.
    Draining,
    /// Result handed back to the caller.
    Done,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::Idle => write!(f, "idle"),
            ScanState::Scanning => write!(f, "scanning"),
            ScanState::Draining => write!(f, "draining"),
            ScanState::Done => write!(f, "done"),
        }
    }
}

/// Default worker thread count: the available hardware parallelism.
#[must_use]
pub fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, usize::from)
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Minimum threads in the scan's pool. The pool grows to
    /// `admission_capacity` so the admission pool is the binding limit.
    pub threads: usize,
    /// Admission tokens shared by listing and hashing (at least 1).
    pub admission_capacity: usize,
    /// Capacity of the event channel feeding the aggregator (at least 1).
    pub channel_capacity: usize,
    /// Mid-scan failure handling.
    pub error_policy: ErrorPolicy,
    /// Traversal strategy.
    pub strategy: ScanStrategy,
    /// Hasher read buffer size in bytes.
    pub buffer_size: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("threads", &self.threads)
            .field("admission_capacity", &self.admission_capacity)
            .field("channel_capacity", &self.channel_capacity)
            .field("error_policy", &self.error_policy)
            .field("strategy", &self.strategy)
            .field("buffer_size", &self.buffer_size)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        let threads = default_threads();
        Self {
            threads,
            admission_capacity: 2 * threads,
            channel_capacity: 2 * threads,
            error_policy: ErrorPolicy::Skip,
            strategy: ScanStrategy::Concurrent,
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the pool thread count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Set the admission capacity. The channel capacity follows it.
    #[must_use]
    pub fn with_admission_capacity(mut self, capacity: usize) -> Self {
        self.admission_capacity = capacity.max(1);
        self.channel_capacity = self.admission_capacity;
        self
    }

    /// Set the event channel capacity.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Set the error policy.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Set the traversal strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: ScanStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the hasher read buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Threads the concurrent scan's pool is built with.
    ///
    /// Every task blocks on a pool thread while it waits for a token, so a
    /// pool smaller than the admission capacity could never fill it.
    #[must_use]
    pub fn pool_threads(&self) -> usize {
        self.threads.max(self.admission_capacity)
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn hasher(&self) -> Hasher {
        let hasher = Hasher::new().with_buffer_size(self.buffer_size);
        match self.shutdown_flag {
            Some(ref flag) => hasher.with_shutdown_flag(Arc::clone(flag)),
            None => hasher,
        }
    }
}

/// Summary statistics from a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Number of files hashed
    pub files_hashed: usize,
    /// Total bytes read while hashing
    pub bytes_hashed: u64,
    /// Number of directories listed
    pub directories: usize,
    /// Number of fingerprints shared by two or more files
    pub duplicate_groups: usize,
    /// Number of redundant copies (group sizes minus one, summed)
    pub duplicate_files: usize,
    /// Files and subtrees that could not be read
    pub skipped: Vec<Diagnostic>,
    /// Wall-clock duration of the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    fn from_aggregate(aggregate: &Aggregate, scan_duration: Duration) -> Self {
        let dupes = aggregate.grouping.duplicate_groups();
        Self {
            files_hashed: aggregate.grouping.total_files(),
            bytes_hashed: aggregate.bytes_hashed,
            directories: aggregate.directories,
            duplicate_groups: dupes.len(),
            duplicate_files: dupes.iter().map(|g| g.len() - 1).sum(),
            skipped: aggregate.diagnostics.clone(),
            scan_duration,
        }
    }

    /// Number of directories whose subtree was skipped.
    #[must_use]
    pub fn skipped_subtrees(&self) -> usize {
        self.skipped
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Traversal)
            .count()
    }

    /// Number of individual files that could not be hashed.
    #[must_use]
    pub fn skipped_files(&self) -> usize {
        self.skipped
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Hash)
            .count()
    }
}

/// Result of a completed scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Every hashed file grouped by fingerprint
    pub grouping: Grouping,
    /// Scan statistics
    pub summary: ScanSummary,
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A directory could not be listed and the policy is to abort.
    #[error("Traversal failed for {path}: {message}")]
    Traversal {
        /// Directory that could not be listed
        path: PathBuf,
        /// Reason
        message: String,
    },

    /// A file could not be hashed and the policy is to abort.
    #[error("Hashing failed for {path}: {message}")]
    Hash {
        /// File that could not be read
        path: PathBuf,
        /// Reason
        message: String,
    },

    /// The scan's thread pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The aggregator thread panicked.
    #[error("Aggregator failed: {0}")]
    Aggregator(String),

    /// An I/O error occurred while setting up the scan.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FinderError {
    /// Whether this error is about the root argument rather than the scan.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::PathNotFound(_) | Self::NotADirectory(_))
    }

    fn from_diagnostic(diagnostic: &Diagnostic) -> Self {
        match diagnostic.kind {
            DiagnosticKind::Traversal => Self::Traversal {
                path: diagnostic.path.clone(),
                message: diagnostic.message.clone(),
            },
            DiagnosticKind::Hash => Self::Hash {
                path: diagnostic.path.clone(),
                message: diagnostic.message.clone(),
            },
        }
    }
}

/// Duplicate finder that coordinates one scan at a time.
pub struct DuplicateFinder {
    config: FinderConfig,
    state: Mutex<ScanState>,
}

impl fmt::Debug for DuplicateFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplicateFinder")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ScanState::Idle),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poison) => *poison.into_inner(),
        }
    }

    fn transition(&self, next: ScanState) {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        };
        log::debug!("Scan state: {} -> {}", *guard, next);
        *guard = next;
    }

    /// Scan `root` and group every regular non-empty file by fingerprint.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist or is not a directory (before any work)
    /// - The scan is interrupted by the shutdown flag
    /// - A file or subtree could not be read and the policy is [`ErrorPolicy::Abort`]
    /// - The thread pool or aggregator thread could not be started
    pub fn find_duplicates(&self, root: &Path) -> Result<ScanReport, FinderError> {
        let start = Instant::now();
        self.transition(ScanState::Idle);

        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Starting {:?} scan of {} ({} threads, {} admission tokens)",
            self.config.strategy,
            root.display(),
            self.config.pool_threads(),
            self.config.admission_capacity
        );

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_scan_start(root);
        }

        let result = match self.config.strategy {
            ScanStrategy::Concurrent => self.scan_concurrent(root),
            ScanStrategy::Sequential => self.scan_sequential(root),
        };

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_scan_end();
        }

        let aggregate = result?;
        self.transition(ScanState::Done);
        self.finish(aggregate, start.elapsed())
    }

    fn aggregator(&self, receiver: Receiver<ScanEvent>, abort: &Arc<AtomicBool>) -> Aggregator {
        let mut aggregator = Aggregator::new(receiver);
        if self.config.error_policy == ErrorPolicy::Abort {
            aggregator = aggregator.with_abort_flag(Arc::clone(abort));
        }
        if let Some(ref cb) = self.config.progress_callback {
            aggregator = aggregator.with_progress_callback(Arc::clone(cb));
        }
        aggregator
    }

    fn scan_concurrent(&self, root: &Path) -> Result<Aggregate, FinderError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.pool_threads())
            .thread_name(|i| format!("dupscan-worker-{}", i))
            .panic_handler(|_| log::error!("Scan task panicked"))
            .build()?;

        let (sender, receiver) = bounded(self.config.channel_capacity);
        let abort = Arc::new(AtomicBool::new(false));
        let aggregator = self.aggregator(receiver, &abort).spawn()?;

        let tracker = WorkTracker::new();
        let mut ctx = ScanContext::new(
            Arc::new(pool),
            AdmissionController::new(self.config.admission_capacity),
            Arc::clone(&tracker),
            sender,
            self.config.hasher(),
        )
        .with_abort_flag(abort);
        if let Some(ref flag) = self.config.shutdown_flag {
            ctx = ctx.with_shutdown_flag(Arc::clone(flag));
        }
        let ctx = Arc::new(ctx);

        self.transition(ScanState::Scanning);
        ctx.spawn_walk(root.to_path_buf());
        tracker.wait_idle();

        self.transition(ScanState::Draining);
        // Our sender goes with the context; tasks drop theirs as they exit.
        drop(ctx);
        aggregator.join()
    }

    fn scan_sequential(&self, root: &Path) -> Result<Aggregate, FinderError> {
        let (sender, receiver) = bounded(self.config.channel_capacity);
        let abort = Arc::new(AtomicBool::new(false));
        let aggregator = self.aggregator(receiver, &abort).spawn()?;

        let mut walker = SequentialWalker::new(root, self.config.hasher());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        self.transition(ScanState::Scanning);
        for event in walker.walk() {
            if abort.load(Ordering::SeqCst) || sender.send(event).is_err() {
                break;
            }
        }

        self.transition(ScanState::Draining);
        drop(sender);
        aggregator.join()
    }

    fn finish(&self, aggregate: Aggregate, elapsed: Duration) -> Result<ScanReport, FinderError> {
        if self.config.error_policy == ErrorPolicy::Abort {
            if let Some(first) = aggregate.diagnostics.first() {
                log::error!("Scan aborted: {}", first);
                return Err(FinderError::from_diagnostic(first));
            }
        }
        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted after {:?}", elapsed);
            return Err(FinderError::Interrupted);
        }

        let summary = ScanSummary::from_aggregate(&aggregate, elapsed);
        log::info!(
            "Scan complete: {} files, {} duplicate groups, {} skipped in {:?}",
            summary.files_hashed,
            summary.duplicate_groups,
            summary.skipped.len(),
            elapsed
        );

        Ok(ScanReport {
            grouping: aggregate.grouping,
            summary,
        })
    }
}
