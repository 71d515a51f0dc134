#![forbid(unsafe_code)]

//! Single-threaded UI loop with a cross-thread task queue.
//!
//! A [`UiLoop`] owns the scene state `S` (panes, hands, prompts) and runs
//! submitted tasks against it one at a time, in submission order. Any thread
//! can submit through a cloned [`UiScheduler`]; only the thread that created
//! the loop ever touches `S`.
//!
//! The loop can be driven two ways:
//!
//! - **In place**: the owning thread pumps it with [`UiLoop::run_pending`],
//!   [`UiLoop::run_next_timeout`], or [`UiLoop::run_until`]. Tests use this to
//!   act as the UI thread without spawning one.
//! - **Dedicated thread**: [`UiThread::spawn`] builds the scene on a new
//!   thread and blocks it in [`UiLoop::run`] until shutdown.
//!
//! # Invariants
//!
//! 1. Tasks never run concurrently with each other, and never re-entrantly.
//! 2. Tasks from one scheduler run in the order they were submitted.
//! 3. A task that panics is logged and dropped; the loop keeps going.
//! 4. Tasks still queued when the loop is dropped are dropped unrun.

use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle, ThreadId};

use web_time::{Duration, Instant};

use crate::error::HandoffError;

type Task<S> = Box<dyn FnOnce(&mut S) + Send>;

enum Message<S> {
    Run(Task<S>),
    Shutdown,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Submission handle for a [`UiLoop`]. `Send + Sync`, cheap to clone.
pub struct UiScheduler<S> {
    sender: mpsc::Sender<Message<S>>,
    ui_thread: ThreadId,
}

impl<S> Clone for UiScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            ui_thread: self.ui_thread,
        }
    }
}

impl<S> fmt::Debug for UiScheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiScheduler")
            .field("ui_thread", &self.ui_thread)
            .finish()
    }
}

impl<S> UiScheduler<S> {
    /// Queue `task` to run on the UI thread after everything already queued.
    ///
    /// # Errors
    ///
    /// [`HandoffError::LoopClosed`] if the loop is gone. The task is dropped
    /// unrun.
    pub fn run_later<F>(&self, task: F) -> Result<(), HandoffError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.sender
            .send(Message::Run(Box::new(task)))
            .map_err(|_| HandoffError::LoopClosed)
    }

    /// Whether the calling thread is the loop's thread.
    #[must_use]
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    #[must_use]
    pub fn ui_thread_id(&self) -> ThreadId {
        self.ui_thread
    }

    /// Ask [`UiLoop::run`] to return once the tasks queued before this call
    /// have run. Returns `false` if the loop is already gone.
    pub fn request_shutdown(&self) -> bool {
        self.sender.send(Message::Shutdown).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// The UI thread's task queue and the scene it owns.
///
/// Not `Send`: a loop stays on the thread that created it.
pub struct UiLoop<S> {
    scene: S,
    receiver: mpsc::Receiver<Message<S>>,
    scheduler: UiScheduler<S>,
    executed: u64,
    shutdown: bool,
    _pinned: PhantomData<*const ()>,
}

impl<S> UiLoop<S> {
    /// Create a loop owned by the calling thread.
    #[must_use]
    pub fn new(scene: S) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            scene,
            receiver,
            scheduler: UiScheduler {
                sender,
                ui_thread: thread::current().id(),
            },
            executed: 0,
            shutdown: false,
            _pinned: PhantomData,
        }
    }

    /// A handle other threads can submit through.
    #[must_use]
    pub fn scheduler(&self) -> UiScheduler<S> {
        self.scheduler.clone()
    }

    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    #[must_use]
    pub fn into_scene(self) -> S {
        self.scene
    }

    /// Tasks run so far.
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Whether a shutdown request has been received.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown
    }

    /// Run every task that is already queued. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(message) => {
                    if self.dispatch(message) {
                        ran += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return ran,
            }
        }
    }

    /// Wait up to `timeout` for one task and run it. Returns `true` if a task
    /// ran.
    pub fn run_next_timeout(&mut self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => self.dispatch(message),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Pump tasks until `done` holds for the scene or `timeout` elapses.
    /// Returns whether `done` held.
    pub fn run_until(&mut self, mut done: impl FnMut(&S) -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if done(&self.scene) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.run_next_timeout((deadline - now).min(Duration::from_millis(10)));
        }
    }

    /// Run tasks until a shutdown is requested.
    pub fn run(&mut self) {
        tracing::debug!(thread = ?thread::current().name(), "ui loop running");
        while !self.shutdown {
            match self.receiver.recv() {
                Ok(message) => {
                    self.dispatch(message);
                }
                Err(_) => break,
            }
        }
        tracing::debug!(executed = self.executed, "ui loop stopped");
    }

    fn dispatch(&mut self, message: Message<S>) -> bool {
        match message {
            Message::Run(task) => {
                let scene = &mut self.scene;
                if panic::catch_unwind(AssertUnwindSafe(move || task(scene))).is_err() {
                    tracing::error!(task = self.executed, "ui task panicked");
                }
                self.executed += 1;
                true
            }
            Message::Shutdown => {
                self.shutdown = true;
                false
            }
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for UiLoop<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiLoop")
            .field("scene", &self.scene)
            .field("executed", &self.executed)
            .field("shutdown", &self.shutdown)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Dedicated thread
// ---------------------------------------------------------------------------

/// A [`UiLoop`] running on its own thread.
///
/// Dropping the handle requests shutdown and joins the thread.
pub struct UiThread<S> {
    scheduler: UiScheduler<S>,
    handle: Option<JoinHandle<()>>,
}

impl<S: 'static> UiThread<S> {
    /// Spawn a UI thread named `name` whose scene is built by `make_scene` on
    /// that thread.
    ///
    /// # Errors
    ///
    /// The OS refused to spawn the thread, or `make_scene` panicked.
    pub fn spawn<F>(name: impl Into<String>, make_scene: F) -> io::Result<Self>
    where
        F: FnOnce() -> S + Send + 'static,
    {
        let name = name.into();
        let (ready_tx, ready_rx) = mpsc::channel();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            let mut ui = UiLoop::new(make_scene());
            if ready_tx.send(ui.scheduler()).is_err() {
                return;
            }
            ui.run();
        })?;

        let Ok(scheduler) = ready_rx.recv() else {
            let _ = handle.join();
            return Err(io::Error::other(format!(
                "ui thread {name} exited during startup"
            )));
        };
        tracing::debug!(thread = %name, "ui thread started");
        Ok(Self {
            scheduler,
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn scheduler(&self) -> UiScheduler<S> {
        self.scheduler.clone()
    }

    /// Stop the loop after the tasks queued so far and join the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }
}

impl<S> UiThread<S> {
    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.scheduler.request_shutdown();
        if handle.join().is_err() {
            tracing::error!("ui thread panicked");
        }
    }
}

impl<S> fmt::Debug for UiThread<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiThread")
            .field("scheduler", &self.scheduler)
            .field("running", &self.handle.is_some())
            .finish()
    }
}

impl<S> Drop for UiThread<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
