#![forbid(unsafe_code)]

//! Model threads: where game logic runs and blocks on the UI.

use std::io;
use std::thread::{self, JoinHandle};

/// Thread name given to the model thread of `title`.
#[must_use]
pub fn model_thread_name(title: &str) -> String {
    format!("{title} Model Thread")
}

/// Start `f` on a thread named `"<title> Model Thread"`.
///
/// The thread is a producer: it may block in
/// [`SyncBridge`](crate::SyncBridge) handoffs and prompts, so it must never
/// be the UI thread.
///
/// # Errors
///
/// The OS refused to spawn the thread.
pub fn spawn_model_thread<F, T>(title: &str, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let name = model_thread_name(title);
    tracing::debug!(thread = %name, "starting model thread");
    thread::Builder::new().name(name).spawn(f)
}
