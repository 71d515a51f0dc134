#![forbid(unsafe_code)]

//! Insertion-ordered storage for the items of one pane.
//!
//! The registry only stores items. Structural notifications (placing a new
//! item, re-ordering after a removal, dropping a stale selection) are fired by
//! [`OrganizablePane`](crate::OrganizablePane), which owns both the registry
//! and the drag engine.

use crate::error::RegistryError;
use crate::geometry::Point;
use crate::item::{ItemId, PositionedItem};

/// The live set of items in a pane, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: Vec<PositionedItem>,
}

impl ItemRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item.
    ///
    /// # Errors
    ///
    /// Rejects an id that is already present or a width that is negative or
    /// not finite. The registry is unchanged on error.
    pub fn insert(&mut self, item: PositionedItem) -> Result<ItemId, RegistryError> {
        self.check_insert(&item)?;
        let id = item.id();
        self.items.push(item);
        Ok(id)
    }

    /// Whether [`insert`](Self::insert) would accept `item`, without
    /// inserting it.
    ///
    /// # Errors
    ///
    /// The error `insert` would return.
    pub fn check_insert(&self, item: &PositionedItem) -> Result<(), RegistryError> {
        let id = item.id();
        if !item.width().is_finite() || item.width() < 0.0 {
            return Err(RegistryError::InvalidWidth {
                item: id,
                width: item.width(),
            });
        }
        if self.contains(id) {
            return Err(RegistryError::DuplicateItem(id));
        }
        Ok(())
    }

    /// Remove an item, returning it if it was present.
    pub fn remove(&mut self, id: ItemId) -> Option<PositionedItem> {
        let index = self.index_of(id)?;
        Some(self.items.remove(index))
    }

    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.index_of(id).is_some()
    }

    /// Slice position of an item.
    #[must_use]
    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&PositionedItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut PositionedItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[PositionedItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [PositionedItem] {
        &mut self.items
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().map(PositionedItem::id)
    }

    /// The front-most item under `point`.
    ///
    /// Lower depth wins; among equal depths the later-inserted item wins,
    /// matching paint order.
    #[must_use]
    pub fn item_at(&self, point: Point) -> Option<ItemId> {
        self.items
            .iter()
            .filter(|item| item.bounds().contains(point))
            .fold(None::<&PositionedItem>, |best, item| match best {
                Some(b) if b.depth() < item.depth() => Some(b),
                _ => Some(item),
            })
            .map(PositionedItem::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut reg = ItemRegistry::new();
        let item = PositionedItem::new(50.0, 70.0);
        let id = reg.insert(item).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(id));
        assert_eq!(reg.get(id).map(PositionedItem::width), Some(50.0));
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut reg = ItemRegistry::new();
        let item = PositionedItem::new(50.0, 70.0);
        let id = reg.insert(item.clone()).unwrap();
        assert_eq!(reg.insert(item), Err(RegistryError::DuplicateItem(id)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn invalid_width_rejected() {
        let mut reg = ItemRegistry::new();
        assert!(matches!(
            reg.insert(PositionedItem::new(-1.0, 70.0)),
            Err(RegistryError::InvalidWidth { .. })
        ));
        assert!(matches!(
            reg.insert(PositionedItem::new(f64::NAN, 70.0)),
            Err(RegistryError::InvalidWidth { .. })
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_preserves_insertion_order() {
        let mut reg = ItemRegistry::new();
        let a = reg.insert(PositionedItem::new(10.0, 10.0)).unwrap();
        let b = reg.insert(PositionedItem::new(10.0, 10.0)).unwrap();
        let c = reg.insert(PositionedItem::new(10.0, 10.0)).unwrap();
        let removed = reg.remove(b).unwrap();
        assert_eq!(removed.id(), b);
        assert_eq!(reg.ids().collect::<Vec<_>>(), vec![a, c]);
        assert!(reg.remove(b).is_none());
    }

    #[test]
    fn item_at_prefers_lower_depth() {
        let mut reg = ItemRegistry::new();
        let mut back = PositionedItem::new(50.0, 70.0).at(0.0);
        back.set_depth(2.0);
        let mut front = PositionedItem::new(50.0, 70.0).at(30.0);
        front.set_depth(1.0);
        let back = reg.insert(back).unwrap();
        let front = reg.insert(front).unwrap();

        assert_eq!(reg.item_at(Point::new(10.0, 10.0)), Some(back));
        assert_eq!(reg.item_at(Point::new(40.0, 10.0)), Some(front));
        assert_eq!(reg.item_at(Point::new(200.0, 10.0)), None);
    }

    #[test]
    fn check_insert_matches_insert() {
        let mut reg = ItemRegistry::new();
        let item = PositionedItem::new(50.0, 70.0);
        assert!(reg.check_insert(&item).is_ok());
        reg.insert(item.clone()).unwrap();
        assert_eq!(
            reg.check_insert(&item),
            Err(RegistryError::DuplicateItem(item.id()))
        );
        assert!(reg.check_insert(&PositionedItem::new(f64::NAN, 1.0)).is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn item_at_tie_goes_to_later_item() {
        let mut reg = ItemRegistry::new();
        reg.insert(PositionedItem::new(50.0, 70.0)).unwrap();
        let later = reg.insert(PositionedItem::new(50.0, 70.0)).unwrap();
        assert_eq!(reg.item_at(Point::new(5.0, 5.0)), Some(later));
    }
}
