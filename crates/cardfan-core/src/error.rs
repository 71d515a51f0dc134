#![forbid(unsafe_code)]

//! Errors raised by pane mutations.

use thiserror::Error;

use crate::item::ItemId;

/// Why an item could not be registered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("{0} is already registered")]
    DuplicateItem(ItemId),

    #[error("{item} has invalid width {width}")]
    InvalidWidth { item: ItemId, width: f64 },
}
