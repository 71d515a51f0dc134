#![forbid(unsafe_code)]

//! Runtime: the UI loop and everything that crosses into it.
//!
//! # Role in Cardfan
//! `cardfan-runtime` connects model threads (game logic) to panes that live
//! on a single UI thread. Producers never touch UI state directly; they
//! submit closures and, where they need the change on screen before going
//! on, block on a [`SyncBridge`].
//!
//! # Primary responsibilities
//! - **UiLoop / UiScheduler / UiThread**: the serial task queue and its
//!   owner thread.
//! - **SyncBridge**: request, block, complete, with cancellation and a
//!   deadlock guard.
//! - **VisualHand / HandView**: a [`CardsetListener`] that renders cards and
//!   applies batches to a pane atomically.
//! - **OptionPrompt**: a model thread waiting on a player decision.
//!
//! # Threading
//! Scene state `S` never leaves the UI thread. Everything a producer holds
//! (`UiScheduler`, `SyncBridge`, `VisualHand`, `OptionPrompt`) is `Send`.

pub mod cancellation;
pub mod config;
pub mod error;
pub mod model_thread;
pub mod prompt;
pub mod render;
pub mod sync_bridge;
pub mod ui_loop;
pub mod visual_hand;

pub use cancellation::{CancellationSource, CancellationToken};
pub use config::{CardfanConfig, ConfigError, HandoffConfig, MIN_CANCEL_POLL_INTERVAL};
pub use error::{HandError, HandoffError, PromptError, RenderError};
pub use model_thread::{model_thread_name, spawn_model_thread};
pub use prompt::{CONTINUE, OptionPrompt, PromptResponder, continue_prompt};
pub use render::{ArtCatalog, CardArt, FixedSizeFactory, VisualFactory};
pub use sync_bridge::SyncBridge;
pub use ui_loop::{UiLoop, UiScheduler, UiThread};
pub use visual_hand::{CardsetListener, HandView, VisualHand};
