#![forbid(unsafe_code)]

//! Positioned visual items.
//!
//! A [`PositionedItem`] is the pane-side handle for one visual element (a card
//! image in practice). It carries everything the ordering and drag code needs:
//! a measurable size, a horizontal offset, a depth, and selection state.
//!
//! # Depth
//!
//! Larger depth renders further back. Ranked items get depths `n..=1` from
//! left to right; the selected item is lifted to [`FRONT_DEPTH`] until the
//! next reorder or until it is reset.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::Bounds;

/// Depth applied to a freshly selected item so it renders in front of every
/// ranked item.
pub const FRONT_DEPTH: f64 = -1.0;

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a visual item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    /// Allocate a process-unique id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw id. Callers mixing this with [`ItemId::next`] are
    /// responsible for avoiding collisions.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// A visual element placed in a horizontal row.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedItem {
    id: ItemId,
    width: f64,
    height: f64,
    offset: f64,
    depth: f64,
    vertical_shift: f64,
    selected: bool,
    resting_depth: f64,
}

impl PositionedItem {
    /// Create an item with a fresh id.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_id(ItemId::next(), width, height)
    }

    /// Create an item with a caller-chosen id.
    #[must_use]
    pub fn with_id(id: ItemId, width: f64, height: f64) -> Self {
        Self {
            id,
            width,
            height,
            offset: 0.0,
            depth: 0.0,
            vertical_shift: 0.0,
            selected: false,
            resting_depth: 0.0,
        }
    }

    /// Builder-style initial offset.
    #[must_use]
    pub fn at(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Horizontal offset of the left edge.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// Shift the item horizontally by `dx`.
    pub fn translate_x(&mut self, dx: f64) {
        self.offset += dx;
    }

    /// `offset + width`.
    #[inline]
    #[must_use]
    pub fn right_edge(&self) -> f64 {
        self.offset + self.width
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Assign a ranked depth.
    ///
    /// A selected item keeps its selection but the new depth becomes the one
    /// restored by [`reset_selection`](Self::reset_selection).
    pub fn set_depth(&mut self, depth: f64) {
        self.depth = depth;
        self.resting_depth = depth;
    }

    /// Vertical shift currently applied (non-zero only while selected).
    #[inline]
    #[must_use]
    pub fn vertical_shift(&self) -> f64 {
        self.vertical_shift
    }

    #[inline]
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Lift the item: apply `shift` vertically and move it to [`FRONT_DEPTH`].
    ///
    /// Selecting an already selected item only re-applies the shift.
    pub fn select(&mut self, shift: f64) {
        if !self.selected {
            self.resting_depth = self.depth;
            self.selected = true;
        }
        self.vertical_shift = shift;
        self.depth = FRONT_DEPTH;
    }

    /// Undo [`select`](Self::select). No-op when not selected.
    pub fn reset_selection(&mut self) {
        if !self.selected {
            return;
        }
        self.selected = false;
        self.vertical_shift = 0.0;
        self.depth = self.resting_depth;
    }

    /// Current on-screen bounds, including the selection shift.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.offset, self.vertical_shift, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ItemId::next();
        let b = ItemId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn display_format() {
        assert_eq!(ItemId::from_raw(42).to_string(), "item#42");
    }

    #[test]
    fn select_lifts_and_fronts() {
        let mut item = PositionedItem::new(50.0, 70.0);
        item.set_depth(3.0);
        item.select(-20.0);
        assert!(item.is_selected());
        assert_eq!(item.vertical_shift(), -20.0);
        assert_eq!(item.depth(), FRONT_DEPTH);
    }

    #[test]
    fn reset_restores_depth_and_shift() {
        let mut item = PositionedItem::new(50.0, 70.0);
        item.set_depth(3.0);
        item.select(-20.0);
        item.reset_selection();
        assert!(!item.is_selected());
        assert_eq!(item.vertical_shift(), 0.0);
        assert_eq!(item.depth(), 3.0);
    }

    #[test]
    fn reselect_keeps_original_resting_depth() {
        let mut item = PositionedItem::new(50.0, 70.0);
        item.set_depth(2.0);
        item.select(-10.0);
        item.select(-10.0);
        item.reset_selection();
        assert_eq!(item.depth(), 2.0);
    }

    #[test]
    fn ranked_depth_while_selected_is_restored() {
        let mut item = PositionedItem::new(50.0, 70.0);
        item.set_depth(2.0);
        item.select(-10.0);
        item.set_depth(1.0);
        assert!(item.is_selected());
        item.reset_selection();
        assert_eq!(item.depth(), 1.0);
    }

    #[test]
    fn reset_when_not_selected_is_noop() {
        let mut item = PositionedItem::new(50.0, 70.0);
        item.set_depth(4.0);
        let before = item.clone();
        item.reset_selection();
        assert_eq!(item, before);
    }

    #[test]
    fn bounds_follow_shift() {
        let mut item = PositionedItem::new(50.0, 70.0).at(60.0);
        item.select(-20.0);
        let b = item.bounds();
        assert_eq!(b, Bounds::new(60.0, -20.0, 50.0, 70.0));
        assert_eq!(item.right_edge(), 110.0);
    }
}
