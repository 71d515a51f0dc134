#![forbid(unsafe_code)]

//! Pane layout configuration.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Layout parameters for a horizontal pane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct PaneConfig {
    /// Gap between the right edge of one item and the left edge of the next.
    pub spacing: f64,
    /// Vertical shift applied to the selected item (negative lifts it up).
    pub selected_vertical_shift: f64,
    /// Offset of the left-most item.
    pub origin_x: f64,
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self {
            spacing: 10.0,
            selected_vertical_shift: -20.0,
            origin_x: 0.0,
        }
    }
}

impl PaneConfig {
    /// Create a config with the given spacing and selection shift.
    #[must_use]
    pub fn new(spacing: f64, selected_vertical_shift: f64) -> Self {
        Self {
            spacing,
            selected_vertical_shift,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_origin_x(mut self, origin_x: f64) -> Self {
        self.origin_x = origin_x;
        self
    }

    /// Validate parameters.
    ///
    /// Returns a list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.spacing.is_finite() || self.spacing < 0.0 {
            errors.push(format!(
                "pane.spacing must be finite and >= 0, got {}",
                self.spacing
            ));
        }
        if !self.selected_vertical_shift.is_finite() {
            errors.push(format!(
                "pane.selected_vertical_shift must be finite, got {}",
                self.selected_vertical_shift
            ));
        }
        if !self.origin_x.is_finite() {
            errors.push(format!(
                "pane.origin_x must be finite, got {}",
                self.origin_x
            ));
        }
        errors
    }
}
