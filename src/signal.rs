//! Ctrl+C handling.
//!
//! A single [`ShutdownHandler`] owns the flag every scan component polls:
//! admission waits, walker tasks and the hasher's read loop. The signal
//! handler only stores `true`; the scan winds down on its own and the
//! finder reports [`FinderError::Interrupted`](crate::duplicates::FinderError).
//!
//! ```rust,no_run
//! use dupscan::duplicates::FinderConfig;
//! use dupscan::signal::install_handler;
//!
//! let handler = install_handler().expect("signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Trip the flag.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to a [`FinderConfig`](crate::duplicates::FinderConfig).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag before another run in the same process.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler, or reuse the one already installed.
///
/// `ctrlc` allows one handler per process. Repeated calls (several
/// `run_app` invocations in one test binary) get the same flag back, reset.
/// The hook always trips the global handler's flag.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the OS handler cannot be set
/// and no handler was installed earlier.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
    handler.reset();

    let flag = handler.get_flag();
    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing in-flight work...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => log::debug!("Ctrl+C handler installed"),
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, reusing its flag");
        }
        Err(e) => return Err(SignalError::InstallFailed(e)),
    }
    Ok(handler.clone())
}
