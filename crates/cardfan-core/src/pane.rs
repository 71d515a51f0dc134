#![forbid(unsafe_code)]

//! A user-organizable row of items.
//!
//! [`OrganizablePane`] owns an [`ItemRegistry`] and a [`DragEngine`] and keeps
//! them in step: every add places the new item after the current right-most
//! one and re-orders, every remove drops a stale selection and re-orders, and
//! every primary-button release re-orders through the hooks.
//!
//! All methods must be called from the UI thread that owns the pane.

use crate::config::PaneConfig;
use crate::drag::{DragEngine, DragState, HorizontalHooks, PaneHooks};
use crate::error::RegistryError;
use crate::event::PointerEvent;
use crate::item::{ItemId, PositionedItem};
use crate::ordering;
use crate::registry::ItemRegistry;

/// Items the user can re-arrange by dragging.
#[derive(Debug, Clone)]
pub struct OrganizablePane<H = HorizontalHooks> {
    registry: ItemRegistry,
    engine: DragEngine<H>,
}

impl OrganizablePane<HorizontalHooks> {
    /// A single-row pane with the stock hooks.
    #[must_use]
    pub fn horizontal(config: PaneConfig) -> Self {
        Self::new(HorizontalHooks::new(config))
    }
}

impl Default for OrganizablePane<HorizontalHooks> {
    fn default() -> Self {
        Self::horizontal(PaneConfig::default())
    }
}

impl<H: PaneHooks> OrganizablePane<H> {
    #[must_use]
    pub fn new(hooks: H) -> Self {
        Self {
            registry: ItemRegistry::new(),
            engine: DragEngine::new(hooks),
        }
    }

    /// Register an item, place it after the right-most item, and re-order.
    ///
    /// # Errors
    ///
    /// See [`ItemRegistry::insert`]. The pane is unchanged on error.
    pub fn add(&mut self, item: PositionedItem) -> Result<ItemId, RegistryError> {
        let id = self.registry.insert(item)?;
        self.engine.item_added(&mut self.registry, id);
        tracing::debug!(item = %id, count = self.registry.len(), "item added");
        Ok(id)
    }

    /// Remove an item and re-order the rest. Returns the detached item, reset
    /// if it was selected.
    pub fn remove(&mut self, id: ItemId) -> Option<PositionedItem> {
        let mut removed = self.registry.remove(id)?;
        self.engine.item_removed(&mut self.registry, &mut removed);
        tracing::debug!(item = %id, count = self.registry.len(), "item removed");
        Some(removed)
    }

    /// Feed a pointer event from the toolkit. Returns `true` if it changed
    /// pane state.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        self.engine.handle(&mut self.registry, event)
    }

    /// Reset and clear the selection. A press in progress ends here and the
    /// row is re-laid out. No-op when nothing is selected.
    pub fn deselect_item(&mut self) -> Option<ItemId> {
        self.engine.deselect(&mut self.registry)
    }

    /// The most recently pressed item, if still selected.
    #[must_use]
    pub fn selected_item(&self) -> Option<ItemId> {
        self.engine.session().selected()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&PositionedItem> {
        self.selected_item().and_then(|id| self.registry.get(id))
    }

    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.engine.state()
    }

    /// Re-layout now.
    pub fn order_items(&mut self) {
        self.engine.order_items(&mut self.registry);
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&PositionedItem> {
        self.registry.get(id)
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[PositionedItem] {
        self.registry.items()
    }

    /// Ids left to right.
    #[must_use]
    pub fn ids_in_rank_order(&self) -> Vec<ItemId> {
        let items = self.registry.items();
        ordering::rank_order(items)
            .into_iter()
            .map(|index| items[index].id())
            .collect()
    }

    #[must_use]
    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    #[must_use]
    pub fn hooks(&self) -> &H {
        self.engine.hooks()
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        self.engine.hooks_mut()
    }
}
