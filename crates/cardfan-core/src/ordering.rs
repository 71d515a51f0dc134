#![forbid(unsafe_code)]

//! Horizontal re-layout and depth assignment.
//!
//! # Invariants
//!
//! After [`reorder`] on `n > 0` items:
//!
//! 1. The item with the smallest rank sits at `origin_x`.
//! 2. For adjacent ranks `i`, `i + 1`:
//!    `offset(i + 1) == offset(i) + width(i) + spacing`.
//! 3. Depths are exactly `n, n - 1, ..., 1` in rank order, so later items
//!    overlap earlier ones when spacing is tight.
//!
//! # Ranking
//!
//! Items are ranked by their offset *before* the pass. The comparison
//! truncates the offset difference toward zero, so two items less than one
//! unit apart compare equal and keep their insertion order. That relation is
//! not transitive, which is why ranking uses a stable insertion sort rather
//! than `slice::sort_by` (which may panic on a non-total order).

use std::cmp::Ordering;

use crate::item::PositionedItem;

/// Compare two offsets the way the ranking pass does.
#[inline]
#[must_use]
pub fn compare_offsets(a: f64, b: f64) -> Ordering {
    ((a - b) as i64).cmp(&0)
}

/// Indices of `items` in rank order (ascending offset, insertion order on ties).
#[must_use]
pub fn rank_order(items: &[PositionedItem]) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..items.len()).collect();
    for i in 1..ranked.len() {
        let mut j = i;
        while j > 0
            && compare_offsets(items[ranked[j - 1]].offset(), items[ranked[j]].offset())
                == Ordering::Greater
        {
            ranked.swap(j - 1, j);
            j -= 1;
        }
    }
    ranked
}

/// Re-layout `items` left to right from `origin_x` and assign depths.
///
/// The slice itself is not reordered; only offsets and depths change.
pub fn reorder(items: &mut [PositionedItem], spacing: f64, origin_x: f64) {
    if items.is_empty() {
        return;
    }
    debug_assert!(spacing >= 0.0, "spacing must be non-negative, got {spacing}");

    let ranked = rank_order(items);
    let count = ranked.len();
    let mut next_offset = origin_x;
    for (rank, &index) in ranked.iter().enumerate() {
        let item = &mut items[index];
        item.set_offset(next_offset);
        item.set_depth((count - rank) as f64);
        next_offset = item.right_edge() + spacing;
    }

    tracing::trace!(count, spacing, origin_x, "reordered items");
    debug_assert!(is_ranked(items), "reorder left items out of rank order");
}

/// Place `items[index]` just right of the right-most other item, or at
/// `origin_x` when it is the only item.
///
/// Ties for right-most resolve to the first item in slice order.
pub fn place_after_last(items: &mut [PositionedItem], index: usize, spacing: f64, origin_x: f64) {
    let mut last: Option<usize> = None;
    for (i, item) in items.iter().enumerate() {
        if i == index {
            continue;
        }
        match last {
            Some(l) if item.offset() <= items[l].offset() => {}
            _ => last = Some(i),
        }
    }

    let offset = match last {
        Some(l) => items[l].right_edge() + spacing,
        None => origin_x,
    };
    if let Some(item) = items.get_mut(index) {
        item.set_offset(offset);
    }
}

/// Whether depths strictly decrease along ascending offset, with the
/// left-most item at depth `n` and the right-most at depth `1`.
///
/// Only meaningful right after [`reorder`]; selection and dragging break it
/// on purpose.
#[must_use]
pub fn is_ranked(items: &[PositionedItem]) -> bool {
    let mut sorted: Vec<&PositionedItem> = items.iter().collect();
    // Zero-width items with zero spacing share an offset; rank them by depth.
    sorted.sort_by(|a, b| {
        a.offset()
            .total_cmp(&b.offset())
            .then(b.depth().total_cmp(&a.depth()))
    });
    let n = sorted.len();
    sorted
        .iter()
        .enumerate()
        .all(|(rank, item)| item.depth() == (n - rank) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(width: f64, offset: f64) -> PositionedItem {
        PositionedItem::new(width, 70.0).at(offset)
    }

    fn offsets(items: &[PositionedItem]) -> Vec<f64> {
        items.iter().map(PositionedItem::offset).collect()
    }

    fn depths(items: &[PositionedItem]) -> Vec<f64> {
        items.iter().map(PositionedItem::depth).collect()
    }

    #[test]
    fn empty_is_noop() {
        let mut items: Vec<PositionedItem> = Vec::new();
        reorder(&mut items, 10.0, 0.0);
        assert!(items.is_empty());
    }

    #[test]
    fn single_item_goes_to_origin() {
        let mut items = vec![item(50.0, 300.0)];
        reorder(&mut items, 10.0, 25.0);
        assert_eq!(items[0].offset(), 25.0);
        assert_eq!(items[0].depth(), 1.0);
    }

    #[test]
    fn three_items_in_a_row() {
        let mut items = vec![item(50.0, 0.0), item(50.0, 60.0), item(50.0, 120.0)];
        reorder(&mut items, 10.0, 0.0);
        assert_eq!(offsets(&items), vec![0.0, 60.0, 120.0]);
        assert_eq!(depths(&items), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn ranks_by_current_offset_not_slice_order() {
        let mut items = vec![item(50.0, 200.0), item(30.0, 0.0), item(40.0, 100.0)];
        reorder(&mut items, 5.0, 0.0);
        // rank: [1] at 0, [2] at 35, [0] at 80
        assert_eq!(offsets(&items), vec![80.0, 0.0, 35.0]);
        assert_eq!(depths(&items), vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn uses_leader_width_for_gap() {
        let mut items = vec![item(20.0, 0.0), item(80.0, 1.0e3), item(10.0, 2.0e3)];
        reorder(&mut items, 0.0, 0.0);
        assert_eq!(offsets(&items), vec![0.0, 20.0, 100.0]);
    }

    #[test]
    fn sub_unit_gap_keeps_insertion_order() {
        // 0.5 apart: truncated difference is 0, so slice order wins.
        let mut items = vec![item(50.0, 10.5), item(50.0, 10.0)];
        reorder(&mut items, 10.0, 0.0);
        assert_eq!(offsets(&items), vec![0.0, 60.0]);
    }

    #[test]
    fn equal_offsets_keep_insertion_order() {
        let mut items = vec![item(50.0, 0.0), item(50.0, 0.0), item(50.0, 0.0)];
        let ids: Vec<_> = items.iter().map(PositionedItem::id).collect();
        reorder(&mut items, 10.0, 0.0);
        let ranked: Vec<_> = rank_order(&items).into_iter().map(|i| items[i].id()).collect();
        assert_eq!(ranked, ids);
        assert_eq!(offsets(&items), vec![0.0, 60.0, 120.0]);
    }

    #[test]
    fn compare_offsets_truncates() {
        assert_eq!(compare_offsets(1.9, 1.0), Ordering::Equal);
        assert_eq!(compare_offsets(2.0, 1.0), Ordering::Greater);
        assert_eq!(compare_offsets(-0.9, 0.0), Ordering::Equal);
        assert_eq!(compare_offsets(0.0, 1.5), Ordering::Less);
    }

    #[test]
    fn reorder_is_idempotent() {
        let mut items = vec![item(50.0, 90.0), item(30.0, 10.0), item(40.0, 400.0)];
        reorder(&mut items, 7.0, 3.0);
        let once = items.clone();
        reorder(&mut items, 7.0, 3.0);
        assert_eq!(items, once);
    }

    #[test]
    fn place_after_last_on_only_item() {
        let mut items = vec![item(50.0, 999.0)];
        place_after_last(&mut items, 0, 10.0, 5.0);
        assert_eq!(items[0].offset(), 5.0);
    }

    #[test]
    fn place_after_last_uses_rightmost_other() {
        let mut items = vec![item(50.0, 60.0), item(30.0, 0.0), item(50.0, 0.0)];
        place_after_last(&mut items, 2, 10.0, 0.0);
        assert_eq!(items[2].offset(), 120.0);
    }

    #[test]
    fn place_after_last_ignores_self() {
        let mut items = vec![item(50.0, 0.0), item(50.0, 500.0)];
        place_after_last(&mut items, 1, 10.0, 0.0);
        assert_eq!(items[1].offset(), 60.0);
    }

    #[test]
    fn is_ranked_detects_violation() {
        let mut items = vec![item(50.0, 0.0), item(50.0, 60.0)];
        reorder(&mut items, 10.0, 0.0);
        assert!(is_ranked(&items));
        items[0].set_depth(1.0);
        assert!(!is_ranked(&items));
    }
}
