//! Item models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Opaque, stable identity of an item in the photo store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single reviewable photo or video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    /// Creation time; newer items come first in a sequence.
    pub sort_key: DateTime<Utc>,
    /// Whatever the presentation layer needs to load the pixels (path, URI, asset handle).
    pub display_ref: String,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, sort_key: DateTime<Utc>, display_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sort_key,
            display_ref: display_ref.into(),
        }
    }
}

/// Canonical sequence order: `sort_key` descending, then id ascending.
///
/// The id tie-break makes the order total, so two listings of the same
/// collection always agree.
pub fn sequence_order(a: &Item, b: &Item) -> Ordering {
    b.sort_key.cmp(&a.sort_key).then_with(|| a.id.cmp(&b.id))
}

/// Sorts items into canonical sequence order.
pub fn into_sequence(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by(sequence_order);
    items
}

/// Index of the item with `id`, if present.
pub fn index_of(sequence: &[Item], id: &ItemId) -> Option<usize> {
    sequence.iter().position(|item| &item.id == id)
}
