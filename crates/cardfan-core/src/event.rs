#![forbid(unsafe_code)]

//! Pointer input types.
//!
//! The host toolkit translates its native mouse events into [`PointerEvent`]s
//! and hands them to [`OrganizablePane::handle_pointer`](crate::OrganizablePane::handle_pointer)
//! on the UI thread.
//!
//! # Design Notes
//!
//! - Coordinates are in pane space and only ever used as deltas by the drag
//!   engine, so any consistent origin works.
//! - `target` mirrors the event source of a retained-mode toolkit. When it is
//!   `None` the pane hit-tests the position instead.
//! - Only [`PointerButton::Primary`] drives the state machine.

use crate::geometry::Point;
use crate::item::ItemId;

/// Which pointer button an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Primary (usually left) button.
    Primary,
    /// Secondary (usually right) button.
    Secondary,
    /// Middle button.
    Middle,
}

/// The phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Button pressed down.
    Press(PointerButton),
    /// Pointer moved while the button is held.
    Drag(PointerButton),
    /// Button released.
    Release(PointerButton),
}

impl PointerEventKind {
    /// The button this event refers to.
    #[must_use]
    pub const fn button(self) -> PointerButton {
        match self {
            Self::Press(b) | Self::Drag(b) | Self::Release(b) => b,
        }
    }
}

/// A pointer event delivered to a pane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// What happened.
    pub kind: PointerEventKind,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// The item the event was delivered to, if the toolkit knows it.
    pub target: Option<ItemId>,
}

impl PointerEvent {
    /// Create a new pointer event without a target.
    #[must_use]
    pub const fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            x,
            y,
            target: None,
        }
    }

    /// Primary-button press at `(x, y)`.
    #[must_use]
    pub const fn press(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Press(PointerButton::Primary), x, y)
    }

    /// Primary-button drag to `(x, y)`.
    #[must_use]
    pub const fn drag(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Drag(PointerButton::Primary), x, y)
    }

    /// Primary-button release at `(x, y)`.
    #[must_use]
    pub const fn release(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Release(PointerButton::Primary), x, y)
    }

    /// Attach the item the event was delivered to.
    #[must_use]
    pub const fn on(mut self, target: ItemId) -> Self {
        self.target = Some(target);
        self
    }

    /// Get the position as a point.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether this event refers to the primary button.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.kind.button() == PointerButton::Primary
    }
}
