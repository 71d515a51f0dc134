#![forbid(unsafe_code)]

//! Drag-reorder state machine.
//!
//! [`DragEngine`] turns primary-button pointer events into selection changes,
//! live horizontal dragging, and a re-layout on release. What each transition
//! *does* to an item is delegated to a [`PaneHooks`] implementation supplied
//! at construction; [`HorizontalHooks`] is the stock single-row behavior.
//!
//! # State Machine
//!
//! ```text
//!            press(I)            drag             release
//!   Idle ────────────▶ Pressed ───────▶ Dragging ─────────▶ Selected
//!                        │                                     ▲  │
//!                        └─────────────── release ─────────────┘  │
//!                        ▲                                        │
//!                        └──────────────── press(J) ──────────────┘
//! ```
//!
//! - **press(I)**: reset the previously selected item if it differs from `I`,
//!   select `I`, remember the pointer position.
//! - **drag**: move the pressed item by the pointer delta since the previous
//!   event. Deltas, not absolute positions, so a re-layout mid-drag is safe.
//! - **release**: run [`PaneHooks::on_release`] and stop dragging. The item
//!   stays selected.
//! - **deselect**: reset the selected item and return to `Idle`. If the item
//!   was still pressed, the release hook runs after the reset and the
//!   pointer release that follows is ignored.
//!
//! # Invariants
//!
//! 1. `dragging` is `Some` only between a press and the matching release
//!    (or a deselect).
//! 2. `dragging`, when set, equals `selected`.
//! 3. Non-primary buttons never change state.
//!
//! # Failure Modes
//!
//! - Drag or release with no press in flight is ignored.
//! - Press on an id the registry does not know is ignored.
//! - If the dragged item is removed mid-drag the session drops it silently.

use crate::config::PaneConfig;
use crate::event::{PointerEvent, PointerEventKind};
use crate::geometry::Point;
use crate::item::{ItemId, PositionedItem};
use crate::ordering;
use crate::registry::ItemRegistry;

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Per-transition behavior plugged into a [`DragEngine`].
///
/// Every method except [`order_items`](Self::order_items) has a do-nothing
/// default so implementations only override what they need.
pub trait PaneHooks {
    /// Lift a freshly pressed item.
    fn select_item(&mut self, _item: &mut PositionedItem) {}

    /// Undo [`select_item`](Self::select_item) on the previously selected item.
    fn reset_selected_item(&mut self, _item: &mut PositionedItem) {}

    /// Follow the pointer from `previous` to `current`.
    fn move_item(&mut self, _item: &mut PositionedItem, _current: Point, _previous: Point) {}

    /// Called when the pressed item is released. Defaults to
    /// [`order_items`](Self::order_items).
    fn on_release(&mut self, items: &mut [PositionedItem], _released: ItemId, _at: Point) {
        self.order_items(items);
    }

    /// Re-layout every item. Runs after each add, remove, and (by default)
    /// release.
    fn order_items(&mut self, items: &mut [PositionedItem]);

    /// Initial placement of a newly registered item.
    fn item_added(&mut self, _items: &mut [PositionedItem], _added: usize) {}

    /// Bookkeeping after an item left the registry.
    fn item_removed(&mut self, _removed: &PositionedItem) {}
}

/// Single-row layout: lift on select, horizontal-only drag, re-rank on release.
#[derive(Debug, Clone, Default)]
pub struct HorizontalHooks {
    config: PaneConfig,
}

impl HorizontalHooks {
    #[must_use]
    pub fn new(config: PaneConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PaneConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PaneConfig) {
        self.config = config;
    }
}

impl PaneHooks for HorizontalHooks {
    fn select_item(&mut self, item: &mut PositionedItem) {
        item.select(self.config.selected_vertical_shift);
    }

    fn reset_selected_item(&mut self, item: &mut PositionedItem) {
        item.reset_selection();
    }

    fn move_item(&mut self, item: &mut PositionedItem, current: Point, previous: Point) {
        item.translate_x(current.delta_x(previous));
    }

    fn order_items(&mut self, items: &mut [PositionedItem]) {
        ordering::reorder(items, self.config.spacing, self.config.origin_x);
    }

    fn item_added(&mut self, items: &mut [PositionedItem], added: usize) {
        ordering::place_after_last(items, added, self.config.spacing, self.config.origin_x);
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Coarse state of the drag engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    /// Nothing selected.
    Idle,
    /// An item is selected but not pressed.
    Selected,
    /// The selected item was just pressed; the pointer has not moved.
    Pressed,
    /// The selected item is pressed and has followed at least one move.
    Dragging,
}

impl DragState {
    /// `Pressed` or `Dragging`: a release is pending.
    #[inline]
    #[must_use]
    pub const fn is_pressed(self) -> bool {
        matches!(self, Self::Pressed | Self::Dragging)
    }
}

/// Pointer session owned by a pane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragSession {
    selected: Option<ItemId>,
    dragging: Option<ItemId>,
    moved: bool,
    last_pointer: Point,
}

impl DragSession {
    #[must_use]
    pub fn selected(&self) -> Option<ItemId> {
        self.selected
    }

    #[must_use]
    pub fn dragging(&self) -> Option<ItemId> {
        self.dragging
    }

    /// Pointer position of the last processed press, drag, or release.
    #[must_use]
    pub fn last_pointer(&self) -> Point {
        self.last_pointer
    }

    #[must_use]
    pub fn state(&self) -> DragState {
        match (self.selected, self.dragging) {
            (_, Some(_)) if self.moved => DragState::Dragging,
            (_, Some(_)) => DragState::Pressed,
            (Some(_), None) => DragState::Selected,
            (None, None) => DragState::Idle,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Pointer-driven selection and drag-reorder over an [`ItemRegistry`].
#[derive(Debug, Clone, Default)]
pub struct DragEngine<H> {
    hooks: H,
    session: DragSession,
}

impl<H: PaneHooks> DragEngine<H> {
    #[must_use]
    pub fn new(hooks: H) -> Self {
        Self {
            hooks,
            session: DragSession::default(),
        }
    }

    #[must_use]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    #[must_use]
    pub fn session(&self) -> &DragSession {
        &self.session
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> DragState {
        self.session.state()
    }

    /// Feed one pointer event. Returns `true` if the event changed state.
    pub fn handle(&mut self, registry: &mut ItemRegistry, event: &PointerEvent) -> bool {
        if !event.is_primary() {
            return false;
        }
        let pos = event.position();
        match event.kind {
            PointerEventKind::Press(_) => {
                let target = event.target.or_else(|| registry.item_at(pos));
                match target {
                    Some(id) => self.press(registry, id, pos),
                    None => false,
                }
            }
            PointerEventKind::Drag(_) => self.drag(registry, pos),
            PointerEventKind::Release(_) => self.release(registry, pos),
        }
    }

    fn press(&mut self, registry: &mut ItemRegistry, id: ItemId, pos: Point) -> bool {
        if !registry.contains(id) {
            tracing::warn!(item = %id, "press on unregistered item ignored");
            return false;
        }

        if let Some(previous) = self.session.selected
            && previous != id
        {
            if let Some(item) = registry.get_mut(previous) {
                self.hooks.reset_selected_item(item);
            }
        }

        if let Some(item) = registry.get_mut(id) {
            self.hooks.select_item(item);
        }
        self.session.selected = Some(id);
        self.session.dragging = Some(id);
        self.session.moved = false;
        self.session.last_pointer = pos;
        tracing::debug!(item = %id, x = pos.x, "item pressed");
        true
    }

    fn drag(&mut self, registry: &mut ItemRegistry, pos: Point) -> bool {
        let Some(id) = self.session.dragging else {
            return false;
        };
        let Some(item) = registry.get_mut(id) else {
            self.session.dragging = None;
            self.session.moved = false;
            return false;
        };
        let previous = self.session.last_pointer;
        self.hooks.move_item(item, pos, previous);
        self.session.moved = true;
        self.session.last_pointer = pos;
        tracing::trace!(item = %id, dx = pos.delta_x(previous), "item dragged");
        true
    }

    fn release(&mut self, registry: &mut ItemRegistry, pos: Point) -> bool {
        let Some(id) = self.session.dragging.take() else {
            return false;
        };
        self.session.moved = false;
        self.session.last_pointer = pos;
        self.hooks.on_release(registry.items_mut(), id, pos);
        tracing::debug!(item = %id, x = pos.x, "item released");
        true
    }

    /// Reset and forget the selected item. Returns the id that was selected.
    ///
    /// Deselecting a pressed item ends the press: the item is reset, then
    /// [`PaneHooks::on_release`] runs at the last pointer position, and the
    /// later pointer release is ignored.
    ///
    /// No-op when nothing is selected, so calling it twice is the same as
    /// calling it once.
    pub fn deselect(&mut self, registry: &mut ItemRegistry) -> Option<ItemId> {
        let id = self.session.selected.take()?;
        let was_pressed = self.session.dragging.take().is_some();
        self.session.moved = false;
        if let Some(item) = registry.get_mut(id) {
            self.hooks.reset_selected_item(item);
        }
        if was_pressed {
            let at = self.session.last_pointer;
            self.hooks.on_release(registry.items_mut(), id, at);
            tracing::debug!(item = %id, "press ended by deselect");
        }
        tracing::debug!(item = %id, "item deselected");
        Some(id)
    }

    /// Structural hook: `id` was just appended to `registry`.
    pub fn item_added(&mut self, registry: &mut ItemRegistry, id: ItemId) {
        if let Some(index) = registry.index_of(id) {
            self.hooks.item_added(registry.items_mut(), index);
        }
        self.hooks.order_items(registry.items_mut());
    }

    /// Structural hook: `removed` was just taken out of `registry`.
    ///
    /// Drops the removed item from the session, resetting it if it was
    /// selected.
    pub fn item_removed(&mut self, registry: &mut ItemRegistry, removed: &mut PositionedItem) {
        let id = removed.id();
        if self.session.dragging == Some(id) {
            self.session.dragging = None;
            self.session.moved = false;
        }
        if self.session.selected == Some(id) {
            self.session.selected = None;
            self.hooks.reset_selected_item(removed);
        }
        self.hooks.item_removed(removed);
        self.hooks.order_items(registry.items_mut());
    }

    /// Re-run [`PaneHooks::order_items`] over the registry.
    pub fn order_items(&mut self, registry: &mut ItemRegistry) {
        self.hooks.order_items(registry.items_mut());
    }
}
