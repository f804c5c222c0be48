use std::collections::BTreeSet;

use crate::item::ItemId;

/// Notifications a review session broadcasts to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The cursor reached the end of the sequence.
    ReviewComplete,
    /// The sequence is empty after a commit or refresh.
    CollectionEmpty,
    Committed {
        deleted: BTreeSet<ItemId>,
        failed: BTreeSet<ItemId>,
    },
    /// Access to the photo store was denied.
    Unavailable,
}
