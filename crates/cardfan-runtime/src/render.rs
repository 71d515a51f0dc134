#![forbid(unsafe_code)]

//! Rendering collaborator: turning cards into visual items.
//!
//! A [`VisualHand`](crate::VisualHand) never loads art itself. It asks a
//! [`VisualFactory`] for one [`PositionedItem`] per card, on the producer
//! thread, before anything is submitted to the UI loop. A factory failure
//! therefore aborts the whole batch with nothing changed.
//!
//! Two factories ship here: [`FixedSizeFactory`] for uniform card faces and
//! [`ArtCatalog`], an explicit card-to-art registry passed in at
//! construction. Each card's art has a front and a back; which one shows is
//! the hand's per-card face-up flag (see
//! [`HandView::set_face_up`](crate::HandView::set_face_up)).

use std::fmt;
use std::hash::Hash;
use std::sync::RwLock;

use ahash::AHashMap;
use cardfan_core::PositionedItem;

use crate::error::RenderError;

/// Creates the visual item for a card. Called from producer threads.
pub trait VisualFactory<C>: Send + Sync {
    /// Build a fresh item for `card`. Each call must return an item with a new
    /// id.
    ///
    /// # Errors
    ///
    /// Collaborator-specific; the caller does not retry.
    fn create_visual(&self, card: &C) -> Result<PositionedItem, RenderError>;
}

impl<C, F> VisualFactory<C> for F
where
    F: Fn(&C) -> Result<PositionedItem, RenderError> + Send + Sync,
{
    fn create_visual(&self, card: &C) -> Result<PositionedItem, RenderError> {
        self(card)
    }
}

/// Every card gets an item of the same size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSizeFactory {
    width: f64,
    height: f64,
}

impl FixedSizeFactory {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl<C> VisualFactory<C> for FixedSizeFactory {
    fn create_visual(&self, _card: &C) -> Result<PositionedItem, RenderError> {
        Ok(PositionedItem::new(self.width, self.height))
    }
}

/// Art registered for one card.
///
/// Keys are whatever the host toolkit loads: a path, URL, or atlas name.
#[derive(Debug, Clone, PartialEq)]
pub struct CardArt {
    /// Shown while the card is face up.
    pub front: String,
    /// Shown while the card is face down.
    pub back: String,
    pub width: f64,
    pub height: f64,
}

impl CardArt {
    #[must_use]
    pub fn new(front: impl Into<String>, back: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            width,
            height,
        }
    }

    /// The key for the side that is showing.
    #[inline]
    #[must_use]
    pub fn key(&self, face_up: bool) -> &str {
        if face_up { &self.front } else { &self.back }
    }
}

/// Explicit card-to-art registry.
///
/// Cards without registered art fail with [`RenderError::UnresolvedArt`].
/// Registration can continue while producers are rendering.
pub struct ArtCatalog<C> {
    art: RwLock<AHashMap<C, CardArt>>,
}

impl<C> Default for ArtCatalog<C> {
    fn default() -> Self {
        Self {
            art: RwLock::new(AHashMap::new()),
        }
    }
}

impl<C: Eq + Hash> ArtCatalog<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the art for `card`.
    pub fn register(&self, card: C, art: CardArt) -> Option<CardArt> {
        self.art
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(card, art)
    }

    /// The art registered for `card`.
    #[must_use]
    pub fn art_for(&self, card: &C) -> Option<CardArt> {
        self.art
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(card)
            .cloned()
    }

    /// Resource key of the side of `card` that is showing, if registered.
    #[must_use]
    pub fn key_for(&self, card: &C, face_up: bool) -> Option<String> {
        self.art
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(card)
            .map(|art| art.key(face_up).to_owned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.art.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Eq + Hash> FromIterator<(C, CardArt)> for ArtCatalog<C> {
    fn from_iter<I: IntoIterator<Item = (C, CardArt)>>(iter: I) -> Self {
        Self {
            art: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl<C> fmt::Debug for ArtCatalog<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.art.read().map_or(0, |art| art.len());
        f.debug_struct("ArtCatalog").field("cards", &len).finish()
    }
}

impl<C> VisualFactory<C> for ArtCatalog<C>
where
    C: Eq + Hash + fmt::Debug + Send + Sync,
{
    fn create_visual(&self, card: &C) -> Result<PositionedItem, RenderError> {
        let art = self.art.read().unwrap_or_else(|e| e.into_inner());
        match art.get(card) {
            Some(art) => Ok(PositionedItem::new(art.width, art.height)),
            None => {
                tracing::warn!(card = ?card, "no art registered");
                Err(RenderError::UnresolvedArt {
                    card: format!("{card:?}"),
                })
            }
        }
    }
}
