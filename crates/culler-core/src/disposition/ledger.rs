//! Disposition ledger.
//!
//! Maps item ids to their disposition. Because each id holds at most one
//! value, keep and delete are mutually exclusive by construction.

use super::model::Disposition;
use crate::item::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// In-memory ledger of dispositions, serialized as `{ "<id>": "keep" | "delete" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispositionLedger {
    entries: BTreeMap<ItemId, Disposition>,
}

impl DispositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags `id`, replacing any previous tag. Returns the previous tag.
    pub fn mark(&mut self, id: ItemId, disposition: Disposition) -> Option<Disposition> {
        self.entries.insert(id, disposition)
    }

    pub fn mark_keep(&mut self, id: ItemId) -> Option<Disposition> {
        self.mark(id, Disposition::Keep)
    }

    pub fn mark_delete(&mut self, id: ItemId) -> Option<Disposition> {
        self.mark(id, Disposition::Delete)
    }

    /// Returns `id` to the untagged state.
    pub fn clear(&mut self, id: &ItemId) -> Option<Disposition> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &ItemId) -> Option<Disposition> {
        self.entries.get(id).copied()
    }

    /// Empties the delete side only; keep marks survive.
    pub fn clear_delete_marks(&mut self) {
        self.entries.retain(|_, d| *d != Disposition::Delete);
    }

    /// Clears delete marks for exactly the given ids.
    pub fn clear_delete_marks_for<'a>(&mut self, ids: impl IntoIterator<Item = &'a ItemId>) {
        for id in ids {
            if self.entries.get(id) == Some(&Disposition::Delete) {
                self.entries.remove(id);
            }
        }
    }

    /// Snapshot of every id currently marked for deletion.
    ///
    /// The returned set is an owned copy; later ledger mutations do not touch it.
    pub fn pending_delete_ids(&self) -> BTreeSet<ItemId> {
        self.entries
            .iter()
            .filter(|(_, d)| **d == Disposition::Delete)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Drops entries whose id is not in `present`. Returns how many were dropped.
    pub fn retain_present(&mut self, present: &HashSet<&ItemId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| present.contains(id));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, Disposition)> {
        self.entries.iter().map(|(id, d)| (id, *d))
    }
}
