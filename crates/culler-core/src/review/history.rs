//! Undo history.

use crate::disposition::Disposition;
use crate::item::{Item, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One tag action: the cursor position it was applied at and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub index: usize,
    pub direction: Disposition,
}

/// What happens to surviving history entries when the sequence is swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// Forget everything; undo cannot reach past a commit.
    Drop,
    /// Look each entry's item up by id in the new sequence.
    #[default]
    Reindex,
}

/// LIFO stack of tag actions since session start or the last commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize, direction: Disposition) {
        self.entries.push(HistoryEntry { index, direction });
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Carries the stack over from `old` to `new` after a sequence swap.
    ///
    /// Entries whose item (resolved against `old`) is in `removed` are always
    /// dropped. Under [`HistoryPolicy::Reindex`] the rest are re-pointed at
    /// their item's index in `new`, and dropped if the item is gone. Afterwards
    /// every entry index is in bounds for `new`.
    pub fn reanchor(
        &mut self,
        old: &[Item],
        new: &[Item],
        removed: &BTreeSet<ItemId>,
        policy: HistoryPolicy,
    ) {
        match policy {
            HistoryPolicy::Drop => self.entries.clear(),
            HistoryPolicy::Reindex => {
                let positions: HashMap<&ItemId, usize> = new
                    .iter()
                    .enumerate()
                    .map(|(index, item)| (&item.id, index))
                    .collect();

                self.entries = self
                    .entries
                    .iter()
                    .filter_map(|entry| {
                        let id = &old.get(entry.index)?.id;
                        if removed.contains(id) {
                            return None;
                        }
                        let index = *positions.get(id)?;
                        Some(HistoryEntry {
                            index,
                            direction: entry.direction,
                        })
                    })
                    .collect();
            }
        }
    }
}
