#![forbid(unsafe_code)]

//! Blocking option prompts.
//!
//! A model thread that needs a decision from the player builds a prompt with
//! [`OptionPrompt::new`], hands the [`PromptResponder`] to the UI (usually via
//! [`UiScheduler::run_later`](crate::UiScheduler::run_later)), and parks in
//! [`OptionPrompt::wait_for_choice`]. The UI calls
//! [`PromptResponder::choose`] when a button is pressed.
//!
//! The waiting side re-checks the answer after every wakeup. Dropping the
//! responder unanswered releases the waiter with [`PromptError::Abandoned`].

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use web_time::Duration;

use crate::cancellation::CancellationToken;
use crate::config::MIN_CANCEL_POLL_INTERVAL;
use crate::error::PromptError;

/// Label of the single option offered by [`continue_prompt`].
pub const CONTINUE: &str = "Continue";

struct PromptState<T> {
    options: Vec<T>,
    choice: Option<usize>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<PromptState<T>>,
    answered: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, PromptState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Waiting side of a prompt. Owned by the model thread.
pub struct OptionPrompt<T> {
    shared: Arc<Shared<T>>,
}

/// Answering side of a prompt. Owned by the UI.
pub struct PromptResponder<T> {
    shared: Arc<Shared<T>>,
}

impl<T> OptionPrompt<T> {
    /// A prompt offering `options`, in display order.
    #[must_use]
    pub fn new(options: Vec<T>) -> (Self, PromptResponder<T>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(PromptState {
                options,
                choice: None,
                closed: false,
            }),
            answered: Condvar::new(),
        });
        (
            Self {
                shared: Arc::clone(&shared),
            },
            PromptResponder { shared },
        )
    }

    /// Block until the UI answers.
    ///
    /// # Errors
    ///
    /// [`PromptError::Abandoned`] if the responder is dropped unanswered.
    pub fn wait_for_choice(self) -> Result<T, PromptError> {
        let mut state = self.shared.lock();
        loop {
            if let Some(answer) = Self::take_answer(&mut state) {
                return answer;
            }
            state = self
                .shared
                .answered
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// [`wait_for_choice`](Self::wait_for_choice) that also gives up when
    /// `cancel` fires, checking it every `poll` (at least
    /// [`MIN_CANCEL_POLL_INTERVAL`]).
    ///
    /// # Errors
    ///
    /// As `wait_for_choice`, plus [`PromptError::Cancelled`].
    pub fn wait_for_choice_with_cancel(
        self,
        cancel: &CancellationToken,
        poll: Duration,
    ) -> Result<T, PromptError> {
        let poll = poll.max(MIN_CANCEL_POLL_INTERVAL);
        let mut state = self.shared.lock();
        loop {
            if let Some(answer) = Self::take_answer(&mut state) {
                return answer;
            }
            if cancel.is_cancelled() {
                state.closed = true;
                tracing::warn!("prompt wait cancelled");
                return Err(PromptError::Cancelled);
            }
            state = self
                .shared
                .answered
                .wait_timeout(state, poll)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
    }

    fn take_answer(state: &mut PromptState<T>) -> Option<Result<T, PromptError>> {
        if let Some(index) = state.choice {
            state.closed = true;
            return Some(Ok(state.options.swap_remove(index)));
        }
        if state.closed {
            return Some(Err(PromptError::Abandoned));
        }
        None
    }
}

impl<T> fmt::Debug for OptionPrompt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionPrompt").finish_non_exhaustive()
    }
}

impl<T> PromptResponder<T> {
    /// Pick the option at `index`. The first valid call wins.
    ///
    /// # Errors
    ///
    /// [`PromptError::InvalidChoice`] for an out-of-range index,
    /// [`PromptError::AlreadyAnswered`] after a previous choice or once the
    /// waiter has given up.
    pub fn choose(&self, index: usize) -> Result<(), PromptError> {
        let mut state = self.shared.lock();
        if state.choice.is_some() || state.closed {
            return Err(PromptError::AlreadyAnswered);
        }
        let len = state.options.len();
        if index >= len {
            return Err(PromptError::InvalidChoice { index, len });
        }
        state.choice = Some(index);
        drop(state);
        self.shared.answered.notify_all();
        tracing::debug!(option = index, "prompt answered");
        Ok(())
    }

    /// Number of options offered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a choice was made or the waiter went away.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        let state = self.shared.lock();
        state.choice.is_some() || state.closed
    }
}

impl<T: Clone> PromptResponder<T> {
    /// The options, for building buttons.
    #[must_use]
    pub fn options(&self) -> Vec<T> {
        self.shared.lock().options.clone()
    }
}

impl<T: PartialEq> PromptResponder<T> {
    /// Pick the first option equal to `option`.
    ///
    /// # Errors
    ///
    /// As [`choose`](Self::choose); an unknown option is `InvalidChoice` with
    /// `index == len`.
    pub fn choose_option(&self, option: &T) -> Result<(), PromptError> {
        let index = {
            let state = self.shared.lock();
            state
                .options
                .iter()
                .position(|candidate| candidate == option)
                .unwrap_or(state.options.len())
        };
        self.choose(index)
    }
}

impl<T> Drop for PromptResponder<T> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        if state.choice.is_none() && !state.closed {
            state.closed = true;
            drop(state);
            self.shared.answered.notify_all();
        }
    }
}

impl<T> fmt::Debug for PromptResponder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptResponder")
            .field("options", &self.len())
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// A prompt with the single option [`CONTINUE`], for pausing a model thread
/// until the player acknowledges.
#[must_use]
pub fn continue_prompt() -> (OptionPrompt<&'static str>, PromptResponder<&'static str>) {
    OptionPrompt::new(vec![CONTINUE])
}
