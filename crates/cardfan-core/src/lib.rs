#![forbid(unsafe_code)]

//! Core: positioned items, ordering, and the drag-reorder state machine.
//!
//! # Role in Cardfan
//! `cardfan-core` is the UI-thread half of the system. It owns the data model
//! for a horizontal row of visual items and everything that mutates it in
//! response to pointer input or structural changes.
//!
//! # Primary responsibilities
//! - **PositionedItem**: a visual handle with offset, depth, and selection state.
//! - **Ordering**: deterministic re-layout and depth assignment ([`ordering::reorder`]).
//! - **DragEngine**: press / drag / release handling with pluggable [`PaneHooks`].
//! - **OrganizablePane**: an [`ItemRegistry`] wired to a [`DragEngine`] so that
//!   every add, remove, and release re-orders the row.
//!
//! # How it fits in the system
//! The runtime (`cardfan-runtime`) owns the UI loop and the cross-thread
//! handoff. It only ever touches a pane from the UI thread, so nothing in this
//! crate is synchronized.

pub mod config;
pub mod drag;
pub mod error;
pub mod event;
pub mod geometry;
pub mod item;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod ordering;
pub mod pane;
pub mod registry;

pub use config::PaneConfig;
pub use drag::{DragEngine, DragSession, DragState, HorizontalHooks, PaneHooks};
pub use error::RegistryError;
pub use event::{PointerButton, PointerEvent, PointerEventKind};
pub use geometry::{Bounds, Point};
pub use item::{FRONT_DEPTH, ItemId, PositionedItem};
pub use pane::OrganizablePane;
pub use registry::ItemRegistry;
