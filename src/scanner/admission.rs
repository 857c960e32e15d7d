//! Admission control for in-flight traversal and hashing work.
//!
//! # Purpose
//!
//! Bounds the number of directory listings and file reads running at once,
//! independent of tree shape. A single pool is shared by walker and hasher
//! tasks so wide and deep trees throttle the same way.
//!
//! # Correctness Invariants
//!
//! - **Bounded**: tokens in use never exceed capacity
//! - **Leak-free**: [`AdmissionToken`] is RAII; dropping it releases
//! - **Non-blocking release**: release takes the lock briefly and notifies
//!
//! | Operation        | Cost                    |
//! |------------------|-------------------------|
//! | try_acquire()    | Lock + check + unlock   |
//! | acquire()        | Lock + condvar wait     |
//! | release (drop)   | Lock + notify_one       |

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// How often a blocked [`AdmissionController::acquire_unless`] re-checks
/// its cancellation predicate.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
struct State {
    /// Currently available tokens.
    avail: usize,
    /// Highest number of tokens held at once.
    peak: usize,
}

/// Fixed-capacity counting semaphore.
///
/// Shared across tasks via `Arc<AdmissionController>`.
#[derive(Debug)]
pub struct AdmissionController {
    capacity: usize,
    state: Mutex<State>,
    cv: Condvar,
}

impl AdmissionController {
    /// Create a controller with `capacity` tokens.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Arc<Self> {
        assert!(capacity > 0, "admission capacity must be > 0");
        Arc::new(Self {
            capacity,
            state: Mutex::new(State {
                avail: capacity,
                peak: 0,
            }),
            cv: Condvar::new(),
        })
    }

    /// Lock state with poison recovery.
    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        }
    }

    /// Total capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently available. A snapshot; may be stale immediately.
    #[must_use]
    pub fn available(&self) -> usize {
        self.lock().avail
    }

    /// Tokens currently held.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    /// Highest number of tokens held at the same time so far.
    #[must_use]
    pub fn peak_in_use(&self) -> usize {
        self.lock().peak
    }

    fn take(self: &Arc<Self>, st: &mut State) -> AdmissionToken {
        st.avail -= 1;
        st.peak = st.peak.max(self.capacity - st.avail);
        AdmissionToken {
            controller: Arc::clone(self),
        }
    }

    /// Take a token without blocking.
    pub fn try_acquire(self: &Arc<Self>) -> Option<AdmissionToken> {
        let mut st = self.lock();
        if st.avail == 0 {
            return None;
        }
        Some(self.take(&mut st))
    }

    /// Take a token, blocking until one is free.
    pub fn acquire(self: &Arc<Self>) -> AdmissionToken {
        let mut st = self.lock();
        while st.avail == 0 {
            st = match self.cv.wait(st) {
                Ok(guard) => guard,
                Err(poison) => poison.into_inner(),
            };
        }
        self.take(&mut st)
    }

    /// Take a token, blocking until one is free or `cancelled` returns true.
    ///
    /// Returns `None` when cancelled. The predicate is checked before
    /// waiting and then at least every few milliseconds while blocked.
    pub fn acquire_unless<F>(self: &Arc<Self>, cancelled: F) -> Option<AdmissionToken>
    where
        F: Fn() -> bool,
    {
        let mut st = self.lock();
        loop {
            if cancelled() {
                return None;
            }
            if st.avail > 0 {
                return Some(self.take(&mut st));
            }
            st = match self.cv.wait_timeout(st, CANCEL_POLL_INTERVAL) {
                Ok((guard, _)) => guard,
                Err(poison) => poison.into_inner().0,
            };
        }
    }

    fn release_one(&self) {
        let mut st = self.lock();
        debug_assert!(st.avail < self.capacity, "admission token over-released");
        st.avail = (st.avail + 1).min(self.capacity);
        drop(st);
        self.cv.notify_one();
    }
}

/// One unit of admission. Returned to the pool when dropped.
#[derive(Debug)]
#[must_use = "dropping the token releases it immediately"]
pub struct AdmissionToken {
    controller: Arc<AdmissionController>,
}

impl AdmissionToken {
    /// Return the token to the pool now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for AdmissionToken {
    fn drop(&mut self) {
        self.controller.release_one();
    }
}
