#![forbid(unsafe_code)]

//! Cooperative cancellation for blocked producers.
//!
//! A producer thread parked in
//! [`SyncBridge::request_mutation_with_cancel`](crate::SyncBridge::request_mutation_with_cancel)
//! or [`OptionPrompt::wait_for_choice_with_cancel`](crate::OptionPrompt::wait_for_choice_with_cancel)
//! holds a [`CancellationToken`]. Whoever owns the matching
//! [`CancellationSource`] (typically the code tearing down a game) calls
//! [`cancel`](CancellationSource::cancel) and the producer stops waiting with
//! an explicit cancellation result.
//!
//! # Example
//!
//! ```
//! use cardfan_runtime::cancellation::CancellationSource;
//! use std::time::Duration;
//!
//! let source = CancellationSource::new();
//! let token = source.token();
//!
//! let worker = std::thread::spawn(move || token.wait_timeout(Duration::from_secs(5)));
//! source.cancel();
//! assert!(worker.join().unwrap());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use web_time::{Duration, Instant};

/// Observer side of a cancellation signal. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Signal>,
}

/// Control side of a cancellation signal.
///
/// Dropping the source does not cancel its tokens.
pub struct CancellationSource {
    inner: Arc<Signal>,
}

struct Signal {
    cancelled: AtomicBool,
    wake: (Mutex<()>, Condvar),
}

impl Signal {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
            wake: (Mutex::new(()), Condvar::new()),
        })
    }

    #[inline]
    fn is_set(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl CancellationSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    /// A token observing this source.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Cancel every token of this source and wake their `wait_timeout` calls.
    /// Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let (lock, cvar) = &self.inner.wake;
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        cvar.notify_all();
        tracing::debug!("cancellation requested");
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_set()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    /// A token whose source is already gone, so it is never cancelled.
    #[must_use]
    pub fn never() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_set()
    }

    /// Block until cancelled or `duration` elapses.
    ///
    /// Returns `true` if cancelled.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        let (lock, cvar) = &self.inner.wake;
        let mut guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = cvar
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
