//! Item store port.
//!
//! Defines the contract of the external photo store the review session
//! consumes (device photo library, a directory on disk, a remote album).

use super::model::{Item, ItemId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Access state of the photo store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// The user has not been asked yet.
    NotDetermined,
    Granted,
    Denied,
}

/// Authoritative record of what a batch delete actually removed.
///
/// A result whose `deleted_ids` is a strict subset of the requested ids is a
/// partial success, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_ids: BTreeSet<ItemId>,
}

impl DeleteOutcome {
    pub fn new(deleted_ids: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            deleted_ids: deleted_ids.into_iter().collect(),
        }
    }
}

/// An abstract photo store.
///
/// # Implementation Notes
///
/// - `list_items` returns items in canonical sequence order
///   (see [`sequence_order`](super::sequence_order)).
/// - `list_items` fails with `PermissionDenied` or `StoreUnavailable`.
/// - `delete_items` fails with `StoreUnavailable` only when nothing could be
///   attempted; per-item failures are reported by omission from `deleted_ids`.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Current access state, without prompting.
    async fn permission(&self) -> PermissionState;

    /// Asks for access and returns the resulting state.
    async fn request_permission(&self) -> PermissionState;

    /// Lists all available items, newest first.
    async fn list_items(&self) -> Result<Vec<Item>>;

    /// Removes the given items in one batch.
    async fn delete_items(&self, ids: &BTreeSet<ItemId>) -> Result<DeleteOutcome>;
}
