#![forbid(unsafe_code)]

//! Blocking handoff from producer threads to the UI thread.
//!
//! A producer calls [`SyncBridge::request_mutation`] with a closure over the
//! scene. The closure is queued on the [`UiLoop`](crate::UiLoop); the
//! producer parks on the bridge's condition variable until the UI thread has
//! run it, then gets the closure's return value back.
//!
//! # Protocol
//!
//! Each request takes a ticket. The ticket's outcome slot starts empty and is
//! filled exactly once, on the UI thread, when the queued closure is consumed:
//! `Applied` after it returns, `Panicked` if it unwinds, `Abandoned` if it is
//! dropped without running (the loop went away). The producer re-checks its
//! slot after every wakeup, so spurious wakeups and wakeups meant for other
//! tickets are harmless.
//!
//! # Invariants
//!
//! 1. On `Ok`, the mutation has fully run and its effects are visible to the
//!    producer (the slot is written and read under the same mutex).
//! 2. Only producers wait; the UI thread never blocks on the bridge.
//! 3. A producer's requests apply in the order it made them.
//!
//! # Failure Modes
//!
//! | Situation | Result |
//! |-----------|--------|
//! | Called on the UI thread | `Err(OnUiThread)` immediately, logged at `error` |
//! | Loop dropped before the closure ran | `Err(LoopClosed)` |
//! | Token cancelled while waiting | `Err(Cancelled)`; the closure may still run |
//! | Closure panicked | `Err(MutationPanicked)`; the loop survives |

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

use ahash::AHashMap;

use crate::cancellation::CancellationToken;
use crate::config::HandoffConfig;
use crate::error::HandoffError;
use crate::ui_loop::UiScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Applied,
    Panicked,
    Abandoned,
}

#[derive(Default)]
struct Tickets {
    next: u64,
    /// `None` while the mutation is pending.
    outcomes: AHashMap<u64, Option<Outcome>>,
}

struct Monitor {
    tickets: Mutex<Tickets>,
    completed: Condvar,
}

impl Monitor {
    fn lock(&self) -> MutexGuard<'_, Tickets> {
        self.tickets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Fills the ticket's outcome slot when the queued closure is consumed,
/// whichever way that happens.
struct Completion {
    monitor: Arc<Monitor>,
    ticket: u64,
    applied: bool,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let outcome = if self.applied {
            Outcome::Applied
        } else if thread::panicking() {
            Outcome::Panicked
        } else {
            Outcome::Abandoned
        };
        {
            let mut tickets = self.monitor.lock();
            // Absent when the producer gave up waiting.
            if let Some(slot) = tickets.outcomes.get_mut(&self.ticket) {
                *slot = Some(outcome);
            }
        }
        self.monitor.completed.notify_all();
        tracing::debug!(ticket = self.ticket, ?outcome, "handoff completed");
    }
}

/// Per-instance handoff between producer threads and one UI loop.
pub struct SyncBridge<S> {
    scheduler: UiScheduler<S>,
    monitor: Arc<Monitor>,
    config: HandoffConfig,
}

impl<S> Clone for SyncBridge<S> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            monitor: Arc::clone(&self.monitor),
            config: self.config,
        }
    }
}

impl<S> fmt::Debug for SyncBridge<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncBridge")
            .field("scheduler", &self.scheduler)
            .field("pending", &self.pending())
            .field("config", &self.config)
            .finish()
    }
}

impl<S> SyncBridge<S> {
    #[must_use]
    pub fn scheduler(&self) -> &UiScheduler<S> {
        &self.scheduler
    }

    #[must_use]
    pub fn config(&self) -> &HandoffConfig {
        &self.config
    }

    /// Requests submitted through this bridge whose mutation has not finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.monitor
            .lock()
            .outcomes
            .values()
            .filter(|outcome| outcome.is_none())
            .count()
    }
}

impl<S: 'static> SyncBridge<S> {
    #[must_use]
    pub fn new(scheduler: UiScheduler<S>) -> Self {
        Self::with_config(scheduler, HandoffConfig::default())
    }

    /// An invalid `config` is still used, with its poll interval raised to
    /// [`MIN_CANCEL_POLL_INTERVAL`](crate::config::MIN_CANCEL_POLL_INTERVAL).
    #[must_use]
    pub fn with_config(scheduler: UiScheduler<S>, config: HandoffConfig) -> Self {
        let problems = config.validate();
        if !problems.is_empty() {
            tracing::warn!(
                problems = %problems.join("; "),
                poll = ?config.cancel_poll_interval(),
                "invalid handoff config; using clamped poll interval"
            );
        }
        Self {
            scheduler,
            monitor: Arc::new(Monitor {
                tickets: Mutex::new(Tickets::default()),
                completed: Condvar::new(),
            }),
            config,
        }
    }

    /// Run `op` on the UI thread and block until it has run.
    ///
    /// # Errors
    ///
    /// See the module-level failure table. There is no timeout.
    pub fn request_mutation<R, F>(&self, op: F) -> Result<R, HandoffError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_and_wait(op, None)
    }

    /// [`request_mutation`](Self::request_mutation) that also gives up when
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// As `request_mutation`, plus [`HandoffError::Cancelled`]. A cancelled
    /// mutation that was already queued still runs.
    pub fn request_mutation_with_cancel<R, F>(
        &self,
        op: F,
        cancel: &CancellationToken,
    ) -> Result<R, HandoffError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_and_wait(op, Some(cancel))
    }

    fn submit_and_wait<R, F>(
        &self,
        op: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<R, HandoffError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.scheduler.is_ui_thread() {
            tracing::error!("blocking handoff requested on the UI thread");
            return Err(HandoffError::OnUiThread);
        }

        let ticket = {
            let mut tickets = self.monitor.lock();
            let ticket = tickets.next;
            tickets.next += 1;
            tickets.outcomes.insert(ticket, None);
            ticket
        };

        let result: Arc<Mutex<Option<R>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);
        let completion = Completion {
            monitor: Arc::clone(&self.monitor),
            ticket,
            applied: false,
        };
        let task = move |scene: &mut S| {
            // Bind the whole guard; touching only `applied` would capture a
            // copy of the flag and leave the guard behind.
            let mut completion = completion;
            let value = op(scene);
            *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
            completion.applied = true;
        };

        tracing::debug!(ticket, "handoff submitted");
        // On failure the task, and with it the completion, is already dropped.
        if let Err(err) = self.scheduler.run_later(task) {
            self.monitor.lock().outcomes.remove(&ticket);
            tracing::warn!(ticket, "handoff rejected: UI loop closed");
            return Err(err);
        }

        match self.wait(ticket, cancel)? {
            Outcome::Applied => result
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take()
                .ok_or(HandoffError::MutationPanicked),
            Outcome::Panicked => {
                tracing::error!(ticket, "handoff mutation panicked");
                Err(HandoffError::MutationPanicked)
            }
            Outcome::Abandoned => {
                tracing::warn!(ticket, "handoff dropped: UI loop closed");
                Err(HandoffError::LoopClosed)
            }
        }
    }

    fn wait(
        &self,
        ticket: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<Outcome, HandoffError> {
        let poll = self.config.cancel_poll_interval();
        let mut tickets = self.monitor.lock();
        loop {
            match tickets.outcomes.get(&ticket) {
                Some(Some(outcome)) => {
                    let outcome = *outcome;
                    tickets.outcomes.remove(&ticket);
                    return Ok(outcome);
                }
                Some(None) => {}
                None => return Ok(Outcome::Abandoned),
            }

            match cancel {
                Some(token) if token.is_cancelled() => {
                    tickets.outcomes.remove(&ticket);
                    tracing::warn!(ticket, "handoff wait cancelled");
                    return Err(HandoffError::Cancelled);
                }
                Some(_) => {
                    tickets = self
                        .monitor
                        .completed
                        .wait_timeout(tickets, poll)
                        .unwrap_or_else(|e| e.into_inner())
                        .0;
                }
                None => {
                    tickets = self
                        .monitor
                        .completed
                        .wait(tickets)
                        .unwrap_or_else(|e| e.into_inner());
                }
            }
        }
    }
}
