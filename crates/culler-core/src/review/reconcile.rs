//! Cursor re-anchoring across a sequence swap.
//!
//! The landing spot is captured as an item id before the swap and resolved
//! back to an index afterwards. Index arithmetic alone breaks as soon as the
//! store reorders or inserts items.

use crate::item::{Item, ItemId, index_of};
use std::collections::BTreeSet;

/// Picks the id the cursor should land on once `doomed` is gone.
///
/// - the item under the cursor, if it survives;
/// - else the first survivor after the cursor;
/// - else the last survivor before it;
/// - `None` when nothing survives.
///
/// A cursor at `sequence.len()` (review complete) has no current item and
/// falls through to the backward scan.
pub fn target_id(sequence: &[Item], cursor: usize, doomed: &BTreeSet<ItemId>) -> Option<ItemId> {
    let survives = |item: &&Item| !doomed.contains(&item.id);
    let cursor = cursor.min(sequence.len());

    if let Some(current) = sequence.get(cursor) {
        if survives(&current) {
            return Some(current.id.clone());
        }
    }

    let forward_start = (cursor + 1).min(sequence.len());
    sequence[forward_start..]
        .iter()
        .find(survives)
        .or_else(|| sequence[..cursor].iter().rev().find(survives))
        .map(|item| item.id.clone())
}

/// Resolves a captured target against a fresh sequence.
///
/// Falls back to 0 when there is no target or it vanished; an empty sequence
/// also yields 0, which then equals its length.
pub fn resolve_cursor(target: Option<&ItemId>, sequence: &[Item]) -> usize {
    target.and_then(|id| index_of(sequence, id)).unwrap_or(0)
}
