#![forbid(unsafe_code)]

//! Runtime configuration.
//!
//! [`CardfanConfig`] bundles the pane layout and the handoff parameters.
//! With the `config` feature it loads from TOML; missing sections and keys
//! fall back to their defaults.
//!
//! ```toml
//! [pane]
//! spacing = 12.0
//! selected_vertical_shift = -24.0
//!
//! [handoff]
//! cancel_poll_interval_ms = 5
//! ```

#[cfg(feature = "config")]
use std::path::Path;

use cardfan_core::PaneConfig;
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Duration;

/// Floor for every cancellation poll. Shorter intervals, zero included, are
/// raised to this so a cancellable wait never spins.
pub const MIN_CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Parameters of the blocking producer/UI handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct HandoffConfig {
    /// How often a cancellable wait re-checks its token, in milliseconds.
    pub cancel_poll_interval_ms: u64,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            cancel_poll_interval_ms: 10,
        }
    }
}

impl HandoffConfig {
    /// The poll interval, never below [`MIN_CANCEL_POLL_INTERVAL`].
    #[must_use]
    pub fn cancel_poll_interval(&self) -> Duration {
        Duration::from_millis(self.cancel_poll_interval_ms).max(MIN_CANCEL_POLL_INTERVAL)
    }

    /// Set the poll interval, rounding up to whole milliseconds.
    #[must_use]
    pub fn with_cancel_poll_interval(mut self, interval: Duration) -> Self {
        let millis = interval.as_nanos().div_ceil(1_000_000);
        self.cancel_poll_interval_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.cancel_poll_interval_ms == 0 {
            errors.push("handoff.cancel_poll_interval_ms must be > 0".to_string());
        }
        errors
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct CardfanConfig {
    pub pane: PaneConfig,
    pub handoff: HandoffConfig,
}

impl CardfanConfig {
    /// Every validation problem across sections. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.pane.validate();
        errors.extend(self.handoff.validate());
        errors
    }

    /// `self` if valid.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] listing every problem.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Parse from a TOML string. Does not validate.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Parse from a TOML file on disk. Does not validate.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[cfg(feature = "config")]
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
}
