//! Outstanding-work counter.
//!
//! Every walker and hash task is registered *before* it is spawned and
//! unregisters itself when its [`WorkGuard`] drops. Because a parent always
//! registers its children while still holding its own guard, the count can
//! only reach zero once the whole tree has been processed. That moment is
//! the scan's termination signal.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    outstanding: usize,
    /// Latched the first time `outstanding` returns to zero.
    drained: bool,
}

/// Shared count of not-yet-finished tasks.
#[derive(Debug, Default)]
pub struct WorkTracker {
    state: Mutex<State>,
    cv: Condvar,
}

impl WorkTracker {
    /// Create an idle tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        }
    }

    /// Register one unit of work. Call before spawning the task that owns
    /// the returned guard.
    pub fn register(self: &Arc<Self>) -> WorkGuard {
        let mut st = self.lock();
        if st.drained {
            log::error!("Work registered after the scan drained");
        }
        st.outstanding += 1;
        WorkGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Number of registered, unfinished tasks.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Whether the count has returned to zero.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.lock().drained
    }

    /// Block until every registered task has finished.
    ///
    /// Returns immediately if nothing was ever registered.
    pub fn wait_idle(&self) {
        let mut st = self.lock();
        while st.outstanding > 0 {
            st = match self.cv.wait(st) {
                Ok(guard) => guard,
                Err(poison) => poison.into_inner(),
            };
        }
    }

    fn finish_one(&self) {
        let mut st = self.lock();
        st.outstanding = st.outstanding.saturating_sub(1);
        if st.outstanding == 0 {
            st.drained = true;
            drop(st);
            self.cv.notify_all();
        }
    }
}

/// Registration of one task. Dropping it marks the task finished, whether
/// the task succeeded, failed or unwound.
#[derive(Debug)]
#[must_use = "dropping the guard marks the work finished"]
pub struct WorkGuard {
    tracker: Arc<WorkTracker>,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.tracker.finish_one();
    }
}
