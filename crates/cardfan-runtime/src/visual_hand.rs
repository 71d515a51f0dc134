#![forbid(unsafe_code)]

//! Card hands: a cardset listener backed by a pane on the UI thread.
//!
//! The state is split across the thread boundary:
//!
//! - [`HandView`] lives in the UI loop's scene. It owns an
//!   [`OrganizablePane`] plus the card-to-item identity map (with each card's
//!   face-up flag), and is the only place either is mutated.
//! - [`VisualHand`] is the producer-side handle. It implements
//!   [`CardsetListener`]: it renders the batch through a [`VisualFactory`],
//!   then applies it to the `HandView` in a single blocking handoff.
//!
//! # Invariants
//!
//! 1. Every card in the identity map has exactly one live item in the pane,
//!    and every pane item belongs to exactly one card.
//! 2. A batch is applied as one UI task, so no other UI task (pointer
//!    dispatch included) observes it half-done.
//! 3. A rejected batch leaves the hand unchanged.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use ahash::AHashMap;
use cardfan_core::{
    DragState, HorizontalHooks, ItemId, OrganizablePane, PaneConfig, PaneHooks, PointerEvent,
    PositionedItem, RegistryError,
};

use crate::cancellation::CancellationToken;
use crate::error::{HandError, HandoffError};
use crate::render::VisualFactory;
use crate::sync_bridge::SyncBridge;

/// Receives structural changes of a card collection. Called from the
/// publisher's (non-UI) thread and blocks until the change is on screen.
pub trait CardsetListener<C> {
    /// `cards` joined the collection.
    ///
    /// # Errors
    ///
    /// Rendering, handoff, or pane rejection. Nothing changed on error,
    /// except after [`HandoffError::Cancelled`], where the batch may still
    /// land.
    fn cards_added(&self, cards: &[C]) -> Result<(), HandError>;

    /// `cards` left the collection. Unknown cards are skipped.
    ///
    /// # Errors
    ///
    /// Handoff failures only.
    fn cards_removed(&self, cards: &[C]) -> Result<(), HandError>;
}

// ---------------------------------------------------------------------------
// UI-thread state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CardEntry {
    item: ItemId,
    face_up: bool,
}

/// A pane of cards, owned by the UI thread.
///
/// Cards are face up unless inserted with
/// [`insert_cards_facing`](Self::insert_cards_facing) or turned with
/// [`set_face_up`](Self::set_face_up). The renderer picks the front or back
/// art from [`is_face_up`](Self::is_face_up).
pub struct HandView<C, H = HorizontalHooks> {
    pane: OrganizablePane<H>,
    cards: AHashMap<C, CardEntry>,
    by_item: AHashMap<ItemId, C>,
}

impl<C: Clone + Eq + Hash> HandView<C, HorizontalHooks> {
    #[must_use]
    pub fn horizontal(config: PaneConfig) -> Self {
        Self::new(OrganizablePane::horizontal(config))
    }
}

impl<C: Clone + Eq + Hash> Default for HandView<C, HorizontalHooks> {
    fn default() -> Self {
        Self::horizontal(PaneConfig::default())
    }
}

impl<C, H> HandView<C, H>
where
    C: Clone + Eq + Hash,
    H: PaneHooks,
{
    /// Wrap an empty pane.
    #[must_use]
    pub fn new(pane: OrganizablePane<H>) -> Self {
        debug_assert!(pane.is_empty(), "hand pane must start empty");
        Self {
            pane,
            cards: AHashMap::new(),
            by_item: AHashMap::new(),
        }
    }

    /// Insert every `(card, item)` pair face up, or none of them.
    ///
    /// A card already in the hand gets its old item replaced by the new one,
    /// which is placed last. Within one batch the last item for a card wins.
    ///
    /// # Errors
    ///
    /// The first item the pane would reject. Nothing is inserted.
    pub fn insert_cards(&mut self, batch: Vec<(C, PositionedItem)>) -> Result<(), RegistryError> {
        self.insert_cards_facing(batch, true)
    }

    /// [`insert_cards`](Self::insert_cards) with every card facing
    /// `face_up`. A replaced card takes the new facing.
    ///
    /// # Errors
    ///
    /// As `insert_cards`.
    pub fn insert_cards_facing(
        &mut self,
        batch: Vec<(C, PositionedItem)>,
        face_up: bool,
    ) -> Result<(), RegistryError> {
        let mut batch_ids = Vec::with_capacity(batch.len());
        for (_, item) in &batch {
            self.pane.registry().check_insert(item)?;
            if batch_ids.contains(&item.id()) {
                return Err(RegistryError::DuplicateItem(item.id()));
            }
            batch_ids.push(item.id());
        }

        for (card, item) in batch {
            self.insert_checked(card, item, face_up);
        }
        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Insert one card face up. See [`insert_cards`](Self::insert_cards).
    ///
    /// # Errors
    ///
    /// The pane rejected `item`. Nothing changed.
    pub fn insert_card(&mut self, card: C, item: PositionedItem) -> Result<ItemId, RegistryError> {
        self.pane.registry().check_insert(&item)?;
        let id = item.id();
        self.insert_checked(card, item, true);
        debug_assert!(self.is_consistent());
        Ok(id)
    }

    fn insert_checked(&mut self, card: C, item: PositionedItem, face_up: bool) {
        let Ok(id) = self.pane.add(item) else {
            return;
        };
        let entry = CardEntry { item: id, face_up };
        if let Some(old) = self.cards.insert(card.clone(), entry) {
            self.by_item.remove(&old.item);
            self.pane.remove(old.item);
            tracing::debug!(old = %old.item, new = %id, "card item replaced");
        }
        self.by_item.insert(id, card);
    }

    /// Turn `card` face up or face down. Returns the previous facing, or
    /// `None` if the card is not in the hand.
    pub fn set_face_up(&mut self, card: &C, face_up: bool) -> Option<bool> {
        let entry = self.cards.get_mut(card)?;
        let previous = std::mem::replace(&mut entry.face_up, face_up);
        if previous != face_up {
            tracing::debug!(item = %entry.item, face_up, "card turned");
        }
        Some(previous)
    }

    /// Whether `card` shows its front. `None` if the card is not in the hand.
    #[must_use]
    pub fn is_face_up(&self, card: &C) -> Option<bool> {
        self.cards.get(card).map(|entry| entry.face_up)
    }

    /// Remove a card. Returns its detached item, or `None` if the card is not
    /// in the hand.
    pub fn remove_card(&mut self, card: &C) -> Option<PositionedItem> {
        let id = self.cards.remove(card)?.item;
        self.by_item.remove(&id);
        let removed = self.pane.remove(id);
        debug_assert!(removed.is_some(), "identity map pointed at a missing item");
        debug_assert!(self.is_consistent());
        removed
    }

    /// Remove every known card in `cards`. Returns how many were removed.
    pub fn remove_cards(&mut self, cards: &[C]) -> usize
    where
        C: fmt::Debug,
    {
        let mut removed = 0;
        for card in cards {
            if self.remove_card(card).is_some() {
                removed += 1;
            } else {
                tracing::warn!(card = ?card, "removal of unknown card ignored");
            }
        }
        removed
    }

    /// Forward a pointer event to the pane.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        self.pane.handle_pointer(event)
    }

    /// The card whose item is selected, if any.
    #[must_use]
    pub fn selected_card(&self) -> Option<&C> {
        self.pane
            .selected_item()
            .and_then(|id| self.by_item.get(&id))
    }

    /// Drop the selection, ending any press in progress. Returns the card
    /// that was selected.
    pub fn deselect_card(&mut self) -> Option<C> {
        let id = self.pane.deselect_item()?;
        self.by_item.get(&id).cloned()
    }

    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.pane.drag_state()
    }

    /// Cards left to right.
    #[must_use]
    pub fn cards_in_rank_order(&self) -> Vec<C> {
        self.pane
            .ids_in_rank_order()
            .into_iter()
            .filter_map(|id| self.by_item.get(&id).cloned())
            .collect()
    }

    #[must_use]
    pub fn item_for(&self, card: &C) -> Option<&PositionedItem> {
        self.cards
            .get(card)
            .and_then(|entry| self.pane.item(entry.item))
    }

    #[must_use]
    pub fn card_for(&self, id: ItemId) -> Option<&C> {
        self.by_item.get(&id)
    }

    #[must_use]
    pub fn contains(&self, card: &C) -> bool {
        self.cards.contains_key(card)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Read access to the pane. Structural changes go through the hand.
    #[must_use]
    pub fn pane(&self) -> &OrganizablePane<H> {
        &self.pane
    }

    /// Whether the identity map and the pane agree one-to-one.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.cards.len() == self.by_item.len()
            && self.cards.len() == self.pane.len()
            && self.cards.iter().all(|(card, entry)| {
                self.by_item.get(&entry.item) == Some(card)
                    && self.pane.item(entry.item).is_some()
            })
    }
}

impl<C: fmt::Debug, H> fmt::Debug for HandView<C, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandView")
            .field("cards", &self.cards)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Producer-side handle
// ---------------------------------------------------------------------------

type Locator<S, C, H> = dyn Fn(&mut S) -> &mut HandView<C, H> + Send + Sync;

/// Producer-side handle to a [`HandView`] inside a UI loop's scene.
pub struct VisualHand<C, S, H = HorizontalHooks> {
    bridge: SyncBridge<S>,
    factory: Arc<dyn VisualFactory<C>>,
    locate: Arc<Locator<S, C, H>>,
    cancel: Option<CancellationToken>,
}

impl<C, S, H> Clone for VisualHand<C, S, H> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            factory: Arc::clone(&self.factory),
            locate: Arc::clone(&self.locate),
            cancel: self.cancel.clone(),
        }
    }
}

impl<C, S, H> fmt::Debug for VisualHand<C, S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualHand")
            .field("bridge", &self.bridge)
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

impl<C, S, H> VisualHand<C, S, H>
where
    C: Clone + Eq + Hash + fmt::Debug + Send + 'static,
    S: 'static,
    H: PaneHooks + 'static,
{
    /// `locate` finds this hand's [`HandView`] in the scene; it runs on the UI
    /// thread.
    pub fn new<F, L>(bridge: SyncBridge<S>, factory: F, locate: L) -> Self
    where
        F: VisualFactory<C> + 'static,
        L: Fn(&mut S) -> &mut HandView<C, H> + Send + Sync + 'static,
    {
        Self {
            bridge,
            factory: Arc::new(factory),
            locate: Arc::new(locate),
            cancel: None,
        }
    }

    /// Give up waiting on the UI thread when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn bridge(&self) -> &SyncBridge<S> {
        &self.bridge
    }

    /// Run `f` against the hand on the UI thread and return its result.
    ///
    /// # Errors
    ///
    /// Handoff failures.
    pub fn with_view<R, F>(&self, f: F) -> Result<R, HandoffError>
    where
        F: FnOnce(&mut HandView<C, H>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let locate = Arc::clone(&self.locate);
        self.handoff(move |scene: &mut S| f(locate(scene)))
    }

    /// The selected card, read on the UI thread.
    ///
    /// # Errors
    ///
    /// Handoff failures.
    pub fn selected_card(&self) -> Result<Option<C>, HandoffError> {
        self.with_view(|view| view.selected_card().cloned())
    }

    /// Deselect on the UI thread. Returns the card that was selected.
    ///
    /// # Errors
    ///
    /// Handoff failures.
    pub fn deselect_card(&self) -> Result<Option<C>, HandoffError> {
        self.with_view(HandView::deselect_card)
    }

    /// Turn `card` on the UI thread. Returns its previous facing, or `None`
    /// if it is not in the hand.
    ///
    /// # Errors
    ///
    /// Handoff failures.
    pub fn set_face_up(&self, card: C, face_up: bool) -> Result<Option<bool>, HandoffError> {
        self.with_view(move |view| view.set_face_up(&card, face_up))
    }

    /// [`cards_added`](CardsetListener::cards_added) with every card facing
    /// `face_up`, in the same single handoff.
    ///
    /// # Errors
    ///
    /// As `cards_added`.
    pub fn cards_added_facing(&self, cards: &[C], face_up: bool) -> Result<(), HandError> {
        if cards.is_empty() {
            return Ok(());
        }
        let mut batch = Vec::with_capacity(cards.len());
        for card in cards {
            batch.push((card.clone(), self.factory.create_visual(card)?));
        }

        let count = batch.len();
        self.with_view(move |view| view.insert_cards_facing(batch, face_up))??;
        tracing::debug!(count, face_up, "cards added");
        Ok(())
    }

    fn handoff<R, F>(&self, op: F) -> Result<R, HandoffError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        match &self.cancel {
            Some(token) => self.bridge.request_mutation_with_cancel(op, token),
            None => self.bridge.request_mutation(op),
        }
    }
}

impl<C, S, H> CardsetListener<C> for VisualHand<C, S, H>
where
    C: Clone + Eq + Hash + fmt::Debug + Send + 'static,
    S: 'static,
    H: PaneHooks + 'static,
{
    fn cards_added(&self, cards: &[C]) -> Result<(), HandError> {
        self.cards_added_facing(cards, true)
    }

    fn cards_removed(&self, cards: &[C]) -> Result<(), HandError> {
        if cards.is_empty() {
            return Ok(());
        }
        let cards = cards.to_vec();
        let requested = cards.len();
        let removed = self.with_view(move |view| view.remove_cards(&cards))?;
        tracing::debug!(requested, removed, "cards removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::render::FixedSizeFactory;
    use crate::ui_loop::UiLoop;
    use std::thread;
    use web_time::Duration;

    const PATIENCE: Duration = Duration::from_secs(5);

    fn view() -> HandView<&'static str> {
        HandView::horizontal(PaneConfig::new(10.0, -20.0))
    }

    fn card(width: f64) -> PositionedItem {
        PositionedItem::new(width, 70.0)
    }

    #[test]
    fn insert_lays_out_in_order() {
        let mut hand = view();
        hand.insert_cards(vec![("A", card(50.0)), ("B", card(50.0)), ("C", card(50.0))])
            .unwrap();
        assert_eq!(hand.cards_in_rank_order(), vec!["A", "B", "C"]);
        assert_eq!(hand.item_for(&"C").unwrap().offset(), 120.0);
        assert!(hand.is_consistent());
    }

    #[test]
    fn reinserting_card_replaces_its_item() {
        let mut hand = view();
        hand.insert_cards(vec![("A", card(50.0)), ("B", card(50.0))]).unwrap();
        let old = hand.item_for(&"A").unwrap().id();
        let new = hand.insert_card("A", card(30.0)).unwrap();
        assert_ne!(old, new);
        assert_eq!(hand.len(), 2);
        assert_eq!(hand.pane().len(), 2);
        assert_eq!(hand.cards_in_rank_order(), vec!["B", "A"]);
        assert!(hand.card_for(old).is_none());
        assert!(hand.is_consistent());
    }

    #[test]
    fn bad_item_rejects_whole_batch() {
        let mut hand = view();
        hand.insert_card("A", card(50.0)).unwrap();
        let err = hand
            .insert_cards(vec![("B", card(50.0)), ("C", card(f64::NAN))])
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidWidth { .. }));
        assert_eq!(hand.cards_in_rank_order(), vec!["A"]);
    }

    #[test]
    fn repeated_item_in_batch_is_rejected() {
        let mut hand = view();
        let item = card(50.0);
        let err = hand
            .insert_cards(vec![("A", item.clone()), ("B", item)])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateItem(_)));
        assert!(hand.is_empty());
    }

    #[test]
    fn cards_start_face_up_and_turn() {
        let mut hand = view();
        hand.insert_card("A", card(50.0)).unwrap();
        hand.insert_cards_facing(vec![("HOLE", card(50.0))], false).unwrap();
        assert_eq!(hand.is_face_up(&"A"), Some(true));
        assert_eq!(hand.is_face_up(&"HOLE"), Some(false));

        assert_eq!(hand.set_face_up(&"HOLE", true), Some(false));
        assert_eq!(hand.set_face_up(&"HOLE", true), Some(true));
        assert_eq!(hand.is_face_up(&"HOLE"), Some(true));
        assert_eq!(hand.set_face_up(&"Z", false), None);
        assert_eq!(hand.is_face_up(&"Z"), None);
    }

    #[test]
    fn facing_survives_reorder_and_follows_replacement() {
        let mut hand = view();
        hand.insert_cards_facing(vec![("A", card(50.0)), ("B", card(50.0))], false)
            .unwrap();
        let a = hand.item_for(&"A").unwrap().id();
        hand.handle_pointer(&PointerEvent::press(5.0, 5.0).on(a));
        hand.handle_pointer(&PointerEvent::drag(105.0, 5.0));
        hand.handle_pointer(&PointerEvent::release(105.0, 5.0));
        assert_eq!(hand.cards_in_rank_order(), vec!["B", "A"]);
        assert_eq!(hand.is_face_up(&"A"), Some(false));

        // re-inserting takes the new facing
        hand.insert_card("A", card(50.0)).unwrap();
        assert_eq!(hand.is_face_up(&"A"), Some(true));
        hand.remove_card(&"A");
        assert_eq!(hand.is_face_up(&"A"), None);
        assert!(hand.is_consistent());
    }

    #[test]
    fn remove_skips_unknown_cards() {
        let mut hand = view();
        hand.insert_cards(vec![("A", card(50.0)), ("B", card(50.0))]).unwrap();
        assert_eq!(hand.remove_cards(&["Z", "A"]), 1);
        assert_eq!(hand.cards_in_rank_order(), vec!["B"]);
        assert_eq!(hand.item_for(&"B").unwrap().offset(), 0.0);
    }

    #[test]
    #[tracing_test::traced_test]
    fn unknown_card_removal_is_logged() {
        let mut hand = view();
        assert_eq!(hand.remove_cards(&["ghost"]), 0);
        assert!(logs_contain("removal of unknown card ignored"));
        assert!(logs_contain("ghost"));
    }

    #[test]
    fn selection_maps_back_to_card() {
        let mut hand = view();
        hand.insert_cards(vec![("A", card(50.0)), ("B", card(50.0))]).unwrap();
        assert_eq!(hand.selected_card(), None);
        let b = hand.item_for(&"B").unwrap().id();
        hand.handle_pointer(&PointerEvent::press(65.0, 5.0).on(b));
        assert_eq!(hand.selected_card(), Some(&"B"));
        assert_eq!(hand.deselect_card(), Some("B"));
        assert_eq!(hand.deselect_card(), None);
    }

    #[test]
    fn deselect_card_mid_drag_restores_row() {
        let mut hand = view();
        hand.insert_cards(vec![("A", card(50.0)), ("B", card(50.0)), ("C", card(50.0))])
            .unwrap();
        let b = hand.item_for(&"B").unwrap().id();
        hand.handle_pointer(&PointerEvent::press(70.0, 5.0).on(b));
        hand.handle_pointer(&PointerEvent::drag(170.0, 5.0));
        assert_eq!(hand.deselect_card(), Some("B"));
        assert_eq!(hand.cards_in_rank_order(), vec!["A", "C", "B"]);
        assert_eq!(hand.item_for(&"B").unwrap().offset(), 120.0);
        assert_eq!(hand.drag_state(), DragState::Idle);
    }

    #[test]
    fn removing_selected_card_clears_selection() {
        let mut hand = view();
        hand.insert_card("A", card(50.0)).unwrap();
        hand.handle_pointer(&PointerEvent::press(5.0, 5.0));
        assert_eq!(hand.selected_card(), Some(&"A"));
        hand.remove_card(&"A");
        assert_eq!(hand.selected_card(), None);
        assert_eq!(hand.drag_state(), DragState::Idle);
    }

    type Scene = HandView<&'static str>;

    fn visual_hand(ui: &UiLoop<Scene>) -> VisualHand<&'static str, Scene> {
        VisualHand::new(
            SyncBridge::new(ui.scheduler()),
            FixedSizeFactory::new(50.0, 70.0),
            |view: &mut Scene| view,
        )
    }

    #[test]
    fn listener_adds_and_removes_through_ui_loop() {
        let mut ui = UiLoop::new(view());
        let hand = visual_hand(&ui);
        let producer = thread::spawn(move || -> Result<Option<&'static str>, HandError> {
            hand.cards_added(&["A", "B", "C"])?;
            hand.cards_removed(&["B"])?;
            hand.selected_card().map_err(HandError::from)
        });
        assert!(ui.run_until(|_| producer.is_finished(), PATIENCE));
        assert_eq!(producer.join().unwrap(), Ok(None));
        assert_eq!(ui.scene().cards_in_rank_order(), vec!["A", "C"]);
        assert_eq!(ui.scene().item_for(&"C").unwrap().offset(), 60.0);
    }

    #[test]
    fn hole_card_is_dealt_face_down_and_revealed() {
        let mut ui = UiLoop::new(view());
        let hand = visual_hand(&ui);
        let producer = thread::spawn(move || -> Result<Option<bool>, HandError> {
            hand.cards_added(&["UP"])?;
            hand.cards_added_facing(&["HOLE"], false)?;
            let hidden = hand.with_view(|view| view.is_face_up(&"HOLE"))?;
            assert_eq!(hidden, Some(false));
            Ok(hand.set_face_up("HOLE", true)?)
        });
        assert!(ui.run_until(|_| producer.is_finished(), PATIENCE));
        assert_eq!(producer.join().unwrap(), Ok(Some(false)));
        assert_eq!(ui.scene().is_face_up(&"HOLE"), Some(true));
        assert_eq!(ui.scene().is_face_up(&"UP"), Some(true));
        assert_eq!(ui.scene().cards_in_rank_order(), vec!["UP", "HOLE"]);
    }

    #[test]
    fn render_failure_submits_nothing() {
        let ui = UiLoop::new(view());
        let hand: VisualHand<&'static str, Scene> = VisualHand::new(
            SyncBridge::new(ui.scheduler()),
            |card: &&'static str| {
                if *card == "JOKER" {
                    Err(RenderError::UnresolvedArt {
                        card: (*card).to_string(),
                    })
                } else {
                    Ok(PositionedItem::new(50.0, 70.0))
                }
            },
            |view: &mut Scene| view,
        );
        let bridge = hand.bridge().clone();
        let result = thread::spawn(move || hand.cards_added(&["A", "JOKER"]))
            .join()
            .unwrap();
        assert!(matches!(result, Err(HandError::Render(_))));
        assert_eq!(bridge.pending(), 0);
        assert!(ui.scene().is_empty());
    }

    #[test]
    fn empty_batches_do_not_block() {
        let ui = UiLoop::new(view());
        let hand = visual_hand(&ui);
        // Never pumped: a handoff here would hang.
        let producer = thread::spawn(move || (hand.cards_added(&[]), hand.cards_removed(&[])));
        assert_eq!(producer.join().unwrap(), (Ok(()), Ok(())));
    }
}
