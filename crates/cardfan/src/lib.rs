#![forbid(unsafe_code)]

//! Cardfan public facade crate.
//!
//! Re-exports the types most applications need from `cardfan-core` and
//! `cardfan-runtime`, a single [`Error`] type, and a prelude.
//!
//! A typical setup puts a [`HandView`] in the UI loop's scene and gives the
//! model thread a [`VisualHand`] pointing at it:
//!
//! ```
//! use cardfan::prelude::*;
//!
//! let mut ui = UiLoop::new(HandView::<&'static str>::default());
//! let hand = VisualHand::new(
//!     SyncBridge::new(ui.scheduler()),
//!     FixedSizeFactory::new(50.0, 70.0),
//!     |view: &mut HandView<&'static str>| view,
//! );
//!
//! let model = spawn_model_thread("Demo", move || hand.cards_added(&["AS", "KD"])).unwrap();
//! ui.run_until(|_| model.is_finished(), std::time::Duration::from_secs(5));
//! model.join().unwrap().unwrap();
//!
//! assert_eq!(ui.scene().cards_in_rank_order(), vec!["AS", "KD"]);
//! ```

// --- Core re-exports -------------------------------------------------------

pub use cardfan_core::{
    Bounds, DragState, FRONT_DEPTH, HorizontalHooks, ItemId, OrganizablePane, PaneConfig,
    PaneHooks, Point, PointerButton, PointerEvent, PointerEventKind, PositionedItem,
    RegistryError,
};

// --- Runtime re-exports ----------------------------------------------------

pub use cardfan_runtime::{
    ArtCatalog, CONTINUE, CancellationSource, CancellationToken, CardArt, CardfanConfig,
    CardsetListener, ConfigError, FixedSizeFactory, HandError, HandView, HandoffConfig,
    HandoffError, OptionPrompt, PromptError, PromptResponder, RenderError, SyncBridge, UiLoop,
    UiScheduler, UiThread, VisualFactory, VisualHand, continue_prompt, spawn_model_thread,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for cardfan apps.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Handoff(#[from] HandoffError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Spawning a UI or model thread failed.
    #[error("thread spawn failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HandError> for Error {
    fn from(err: HandError) -> Self {
        match err {
            HandError::Render(e) => Self::Render(e),
            HandError::Handoff(e) => Self::Handoff(e),
            HandError::Registry(e) => Self::Registry(e),
        }
    }
}

/// Standard result type for cardfan APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CardsetListener, DragState, Error, FixedSizeFactory, HandView, OrganizablePane,
        PaneConfig, PointerEvent, PositionedItem, Result, SyncBridge, UiLoop, UiThread,
        VisualHand, spawn_model_thread,
    };
    pub use crate::{core, runtime};
}

pub use cardfan_core as core;
pub use cardfan_runtime as runtime;
