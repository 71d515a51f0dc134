#![forbid(unsafe_code)]

//! Runtime error types.

use cardfan_core::RegistryError;
use thiserror::Error;

/// Why a cross-thread mutation did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandoffError {
    /// Called from the UI thread, where blocking would deadlock the loop.
    #[error("blocking handoff requested from the UI thread")]
    OnUiThread,
    /// The UI loop was dropped before the mutation ran.
    #[error("UI loop closed before the mutation ran")]
    LoopClosed,
    /// The waiting producer was cancelled. The mutation may still run later.
    #[error("handoff wait cancelled")]
    Cancelled,
    /// The mutation panicked on the UI thread.
    #[error("mutation panicked on the UI thread")]
    MutationPanicked,
}

/// Failure of the rendering collaborator to produce a visual item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// No art is registered for the card.
    #[error("no art registered for card {card}")]
    UnresolvedArt { card: String },
    /// Collaborator-specific failure.
    #[error("render failed: {0}")]
    Other(String),
}

/// Failure of a hand-level add or remove.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Handoff(#[from] HandoffError),
    /// The batch was rejected by the pane. Nothing was inserted.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Failure while waiting on an [`OptionPrompt`](crate::OptionPrompt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("prompt wait cancelled")]
    Cancelled,
    /// The responder was dropped without choosing.
    #[error("prompt closed without an answer")]
    Abandoned,
    #[error("option {index} out of range for {len} options")]
    InvalidChoice { index: usize, len: usize },
    #[error("prompt already answered")]
    AlreadyAnswered,
}
