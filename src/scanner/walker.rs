//! Concurrent directory walker.
//!
//! # Overview
//!
//! Each directory is listed by its own task on the scan's thread pool.
//! While listing, a task registers and spawns one sub-walk per
//! subdirectory and one hash task per regular non-empty file; it never
//! descends inline. Listing and hashing both run under an
//! [`AdmissionToken`](super::AdmissionToken) from the shared pool, and the
//! listing token is released as soon as that directory's immediate children
//! have been enumerated.
//!
//! Results and failures travel to the aggregator as [`ScanEvent`]s.
//!
//! [`SequentialWalker`] is the single-threaded baseline: it produces the
//! same event stream from a plain `walkdir` traversal.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{Hasher, ScanEvent, SequentialWalker};
//! use std::path::Path;
//!
//! let walker = SequentialWalker::new(Path::new("."), Hasher::new());
//! for event in walker.walk() {
//!     if let ScanEvent::Record(record) = event {
//!         println!("{} {}", record.fingerprint, record.path.display());
//!     }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use walkdir::WalkDir;

use super::admission::AdmissionController;
use super::hasher::Hasher;
use super::tracker::{WorkGuard, WorkTracker};
use super::{Diagnostic, HashError, ScanError, ScanEvent};

/// State shared by every task of one scan.
pub struct ScanContext {
    pool: Arc<rayon::ThreadPool>,
    admission: Arc<AdmissionController>,
    tracker: Arc<WorkTracker>,
    events: Sender<ScanEvent>,
    hasher: Hasher,
    shutdown_flag: Option<Arc<AtomicBool>>,
    abort_flag: Arc<AtomicBool>,
}

impl std::fmt::Debug for ScanContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanContext")
            .field("threads", &self.pool.current_num_threads())
            .field("admission", &self.admission)
            .field("tracker", &self.tracker)
            .field("hasher", &self.hasher)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("abort_flag", &self.abort_flag)
            .finish()
    }
}

impl ScanContext {
    /// Create a context. Tasks spawned through it run on `pool`.
    #[must_use]
    pub fn new(
        pool: Arc<rayon::ThreadPool>,
        admission: Arc<AdmissionController>,
        tracker: Arc<WorkTracker>,
        events: Sender<ScanEvent>,
        hasher: Hasher,
    ) -> Self {
        Self {
            pool,
            admission,
            tracker,
            events,
            hasher,
            shutdown_flag: None,
            abort_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the external shutdown flag (Ctrl+C).
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Share an abort flag that the coordinator trips on a fatal failure.
    #[must_use]
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort_flag = flag;
        self
    }

    /// Whether tasks should stop doing new work.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.abort_flag.load(Ordering::SeqCst)
            || self
                .shutdown_flag
                .as_ref()
                .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// The shared outstanding-work counter.
    #[must_use]
    pub fn tracker(&self) -> &Arc<WorkTracker> {
        &self.tracker
    }

    /// The shared admission pool.
    #[must_use]
    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    fn emit(&self, event: ScanEvent) {
        if self.events.send(event).is_err() {
            log::debug!("Aggregator gone, dropping scan event");
        }
    }

    /// Register and spawn a walk of `dir`.
    pub fn spawn_walk(self: &Arc<Self>, dir: PathBuf) {
        let guard = self.tracker.register();
        let ctx = Arc::clone(self);
        self.pool.spawn(move || ctx.walk_directory(&dir, guard));
    }

    /// Register and spawn a hash task for `path`.
    pub fn spawn_hash(self: &Arc<Self>, path: PathBuf) {
        let guard = self.tracker.register();
        let ctx = Arc::clone(self);
        self.pool.spawn(move || ctx.hash_task(&path, guard));
    }

    fn walk_directory(self: &Arc<Self>, dir: &Path, _guard: WorkGuard) {
        let Some(token) = self.admission.acquire_unless(|| self.is_cancelled()) else {
            log::trace!("Walker: cancelled before listing {}", dir.display());
            return;
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                token.release();
                let err = ScanError::from_io(dir.to_path_buf(), e);
                log::warn!("Skipping subtree {}: {}", dir.display(), err);
                self.emit(ScanEvent::Skipped(Diagnostic::traversal(&err)));
                return;
            }
        };

        self.emit(ScanEvent::Directory(dir.to_path_buf()));

        for entry in entries {
            if self.is_cancelled() {
                log::debug!("Walker: cancelled while listing {}", dir.display());
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    log::debug!("Skipping entry {}: {}", path.display(), e);
                    continue;
                }
            };

            if file_type.is_dir() {
                self.spawn_walk(path);
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(metadata) if metadata.len() > 0 => self.spawn_hash(path),
                    Ok(_) => log::trace!("Skipping empty file: {}", path.display()),
                    Err(e) => log::debug!("Skipping file {}: {}", path.display(), e),
                }
            } else {
                log::trace!("Skipping non-regular entry: {}", path.display());
            }
        }

        token.release();
    }

    fn hash_task(&self, path: &Path, _guard: WorkGuard) {
        let Some(token) = self.admission.acquire_unless(|| self.is_cancelled()) else {
            log::trace!("Hasher: cancelled before reading {}", path.display());
            return;
        };

        match self.hasher.hash_file(path) {
            Ok(record) => {
                log::trace!("Hashed {} -> {}", path.display(), record.fingerprint);
                self.emit(ScanEvent::Record(record));
            }
            Err(HashError::Interrupted(_)) => {
                log::trace!("Hasher: interrupted reading {}", path.display());
            }
            Err(e) => {
                log::warn!("Skipping file {}: {}", path.display(), e);
                self.emit(ScanEvent::Skipped(Diagnostic::hash(path.to_path_buf(), &e)));
            }
        }

        token.release();
    }
}

/// Single-threaded walk producing the same events as the concurrent walker.
#[derive(Debug)]
pub struct SequentialWalker {
    root: PathBuf,
    hasher: Hasher,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl SequentialWalker {
    /// Create a walker rooted at `root`.
    #[must_use]
    pub fn new(root: &Path, hasher: Hasher) -> Self {
        Self {
            root: root.to_path_buf(),
            hasher,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, yielding one event per listed directory, hashed file
    /// and skipped item.
    ///
    /// A directory that cannot be listed yields only its `Skipped` event,
    /// matching the concurrent walker.
    pub fn walk(&self) -> impl Iterator<Item = ScanEvent> + '_ {
        let mut entries = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("SequentialWalker: Shutdown requested, stopping iteration");
                    return false;
                }
                true
            })
            .peekable();

        std::iter::from_fn(move || loop {
            let entry = entries.next()?;
            if let Ok(ref dir) = entry {
                if dir.file_type().is_dir() {
                    // walkdir yields the entry before the error from opening it
                    let unreadable = matches!(
                        entries.peek(),
                        Some(Err(e)) if e.path() == Some(dir.path())
                    );
                    if unreadable {
                        continue;
                    }
                }
            }
            if let Some(event) = self.event_for(entry) {
                return Some(event);
            }
        })
    }

    fn event_for(&self, entry: walkdir::Result<walkdir::DirEntry>) -> Option<ScanEvent> {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map_or_else(|| self.root.clone(), Path::to_path_buf);
                let err = match e.into_io_error() {
                    Some(io) => ScanError::from_io(path, io),
                    None => ScanError::Io {
                        path,
                        source: std::io::Error::other("filesystem loop detected"),
                    },
                };
                log::warn!("Skipping subtree {}: {}", err.path().display(), err);
                return Some(ScanEvent::Skipped(Diagnostic::traversal(&err)));
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            return Some(ScanEvent::Directory(entry.into_path()));
        }
        if !file_type.is_file() {
            log::trace!("Skipping non-regular entry: {}", entry.path().display());
            return None;
        }
        match entry.metadata() {
            Ok(metadata) if metadata.len() > 0 => {}
            Ok(_) => {
                log::trace!("Skipping empty file: {}", entry.path().display());
                return None;
            }
            Err(e) => {
                log::debug!("Skipping file {}: {}", entry.path().display(), e);
                return None;
            }
        }
        match self.hasher.hash_file(entry.path()) {
            Ok(record) => Some(ScanEvent::Record(record)),
            Err(HashError::Interrupted(_)) => None,
            Err(e) => {
                log::warn!("Skipping file {}: {}", entry.path().display(), e);
                Some(ScanEvent::Skipped(Diagnostic::hash(entry.into_path(), &e)))
            }
        }
    }
}
