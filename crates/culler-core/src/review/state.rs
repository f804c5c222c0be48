//! Review state machine.
//!
//! `ReviewState` owns the sequence, cursor, ledger and history as one unit
//! and applies tag / undo / reconciliation to it synchronously. It knows
//! nothing about I/O: the application layer fetches sequences, issues the
//! batch delete and persists the results.

use super::history::{History, HistoryPolicy};
use super::outcome::{
    CommitReport, RejectReason, ReviewSnapshot, ReviewStats, TagOutcome, UndoOutcome,
};
use super::reconcile::{resolve_cursor, target_id};
use crate::disposition::{Disposition, DispositionLedger};
use crate::item::{DeleteOutcome, Item, ItemId, index_of};
use std::collections::{BTreeSet, HashSet};

/// Everything captured before a batch delete is issued.
///
/// Holding the pre-commit sequence lets history be pruned against the
/// indices it was recorded with, after the live sequence has been swapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    pub pending: BTreeSet<ItemId>,
    pub target: Option<ItemId>,
    pub pre_sequence: Vec<Item>,
}

/// Invariant: `cursor <= sequence.len()`; every history index was a valid
/// cursor for the sequence it was recorded against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewState {
    sequence: Vec<Item>,
    cursor: usize,
    ledger: DispositionLedger,
    history: History,
}

impl ReviewState {
    pub fn new(sequence: Vec<Item>, ledger: DispositionLedger) -> Self {
        Self {
            sequence,
            cursor: 0,
            ledger,
            history: History::new(),
        }
    }

    pub fn sequence(&self) -> &[Item] {
        &self.sequence
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn ledger(&self) -> &DispositionLedger {
        &self.ledger
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.sequence.len()
    }

    pub fn current(&self) -> Option<&Item> {
        self.sequence.get(self.cursor)
    }

    /// Up to `count` items following the current one.
    pub fn lookahead(&self, count: usize) -> &[Item] {
        let start = (self.cursor + 1).min(self.sequence.len());
        let end = (start + count).min(self.sequence.len());
        &self.sequence[start..end]
    }

    /// Moves the cursor onto `id` without recording history.
    pub fn seek(&mut self, id: &ItemId) -> Option<usize> {
        let index = index_of(&self.sequence, id)?;
        self.cursor = index;
        Some(index)
    }

    /// Tags the current item and advances.
    pub fn tag(&mut self, direction: Disposition) -> TagOutcome {
        let Some(item) = self.sequence.get(self.cursor) else {
            return TagOutcome::Rejected(RejectReason::ReviewComplete);
        };

        let id = item.id.clone();
        self.ledger.mark(id.clone(), direction);
        self.history.push(self.cursor, direction);
        self.cursor += 1;

        TagOutcome::Tagged {
            id,
            disposition: direction,
            cursor: self.cursor,
            complete: self.is_complete(),
        }
    }

    /// Reverts the most recent tag and moves the cursor back onto its item.
    pub fn undo(&mut self) -> UndoOutcome {
        let Some(entry) = self.history.pop() else {
            return UndoOutcome::NothingToUndo;
        };

        let Some(item) = self.sequence.get(entry.index) else {
            return UndoOutcome::StaleEntryDiscarded;
        };

        let id = item.id.clone();
        self.ledger.clear(&id);
        self.cursor = entry.index;

        UndoOutcome::Undone {
            id,
            disposition: entry.direction,
            cursor: self.cursor,
        }
    }

    /// Captures what a commit needs before any I/O happens.
    ///
    /// Returns `None` when nothing is marked for deletion.
    pub fn plan_commit(&self) -> Option<CommitPlan> {
        let pending = self.ledger.pending_delete_ids();
        if pending.is_empty() {
            return None;
        }

        let target = target_id(&self.sequence, self.cursor, &pending);
        Some(CommitPlan {
            pending,
            target,
            pre_sequence: self.sequence.clone(),
        })
    }

    /// Swaps in the post-delete sequence and re-anchors cursor, history and ledger.
    ///
    /// Only requested ids the store reports as removed count as committed;
    /// the rest keep their delete mark so the commit can be retried.
    pub fn apply_commit(
        &mut self,
        plan: &CommitPlan,
        outcome: &DeleteOutcome,
        fresh: Vec<Item>,
        policy: HistoryPolicy,
    ) -> CommitReport {
        let deleted: BTreeSet<ItemId> = plan
            .pending
            .intersection(&outcome.deleted_ids)
            .cloned()
            .collect();
        let present: HashSet<&ItemId> = fresh.iter().map(|item| &item.id).collect();
        // Ids the store kept but the listing no longer shows lose their mark below.
        let retained: BTreeSet<ItemId> = plan
            .pending
            .difference(&deleted)
            .filter(|id| present.contains(id))
            .cloned()
            .collect();

        self.ledger.clear_delete_marks_for(&deleted);
        self.history
            .reanchor(&plan.pre_sequence, &fresh, &deleted, policy);
        self.ledger.retain_present(&present);

        self.sequence = fresh;
        self.cursor = resolve_cursor(plan.target.as_ref(), &self.sequence);

        CommitReport {
            requested: plan.pending.clone(),
            deleted,
            retained,
            cursor: self.cursor,
            collection_empty: self.sequence.is_empty(),
        }
    }

    /// Swaps in a fresh listing without a delete, keeping the reviewer in place.
    ///
    /// Items that vanished outside the session are treated like deleted ones
    /// when picking where the cursor lands. A session that was complete stays
    /// after the last item it had seen, so only newly arrived items further
    /// down are left to review.
    pub fn apply_refresh(&mut self, fresh: Vec<Item>, policy: HistoryPolicy) -> usize {
        let cursor = match self.current() {
            Some(_) => {
                let present: HashSet<&ItemId> = fresh.iter().map(|item| &item.id).collect();
                let vanished: BTreeSet<ItemId> = self
                    .sequence
                    .iter()
                    .filter(|item| !present.contains(&item.id))
                    .map(|item| item.id.clone())
                    .collect();
                let target = target_id(&self.sequence, self.cursor, &vanished);
                resolve_cursor(target.as_ref(), &fresh)
            }
            None => self
                .sequence
                .last()
                .and_then(|last| index_of(&fresh, &last.id))
                .map(|index| index + 1)
                .unwrap_or(fresh.len()),
        };

        self.history
            .reanchor(&self.sequence, &fresh, &BTreeSet::new(), policy);
        self.sequence = fresh;
        self.cursor = cursor;
        self.cursor
    }

    /// Id to remember as "last viewed", if the cursor is on an item.
    pub fn last_viewed_id(&self) -> Option<&ItemId> {
        self.current().map(|item| &item.id)
    }

    pub fn stats(&self) -> ReviewStats {
        let mut stats = ReviewStats {
            total: self.sequence.len(),
            reviewed: self.cursor.min(self.sequence.len()),
            ..ReviewStats::default()
        };
        for item in &self.sequence {
            match self.ledger.get(&item.id) {
                Some(Disposition::Keep) => stats.kept += 1,
                Some(Disposition::Delete) => stats.marked_for_delete += 1,
                None => stats.untagged += 1,
            }
        }
        stats
    }

    pub fn snapshot(&self, lookahead: usize, reconciling: bool) -> ReviewSnapshot {
        let current = self.current().cloned();
        let current_disposition = current.as_ref().and_then(|item| self.ledger.get(&item.id));
        ReviewSnapshot {
            current,
            lookahead: self.lookahead(lookahead).to_vec(),
            current_disposition,
            cursor: self.cursor,
            len: self.sequence.len(),
            complete: self.is_complete(),
            can_undo: !self.history.is_empty(),
            reconciling,
            stats: self.stats(),
        }
    }
}
