//! Results of review operations.
//!
//! Every mutating call reports what happened explicitly, including the
//! informational "nothing to do" cases, so callers never have to diff state.

use crate::disposition::Disposition;
use crate::item::{Item, ItemId};
use std::collections::BTreeSet;

/// Why a call was refused without touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The cursor is past the last item.
    ReviewComplete,
    /// A commit or refresh is swapping the sequence.
    Reconciling,
    /// Access to the photo store was denied; there is no sequence.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    Tagged {
        id: ItemId,
        disposition: Disposition,
        /// Cursor after advancing.
        cursor: usize,
        /// True when this tag consumed the last item.
        complete: bool,
    },
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    Undone {
        id: ItemId,
        /// The tag that was removed.
        disposition: Disposition,
        cursor: usize,
    },
    /// The popped entry pointed outside the sequence and was thrown away.
    StaleEntryDiscarded,
    NothingToUndo,
    Rejected(RejectReason),
}

/// What a finished commit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Ids that were marked for deletion when the commit started.
    pub requested: BTreeSet<ItemId>,
    /// Requested ids the store actually removed.
    pub deleted: BTreeSet<ItemId>,
    /// Requested ids the store did not remove that are still listed. These
    /// stay marked for deletion. Ids that vanished from the listing appear in
    /// neither set.
    pub retained: BTreeSet<ItemId>,
    pub cursor: usize,
    pub collection_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(CommitReport),
    NothingToCommit,
    Rejected(RejectReason),
}

/// Counts over the current sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewStats {
    pub total: usize,
    pub kept: usize,
    pub marked_for_delete: usize,
    pub untagged: usize,
    /// Items before the cursor.
    pub reviewed: usize,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSnapshot {
    pub current: Option<Item>,
    /// Items right after the current one, for prefetching.
    pub lookahead: Vec<Item>,
    pub current_disposition: Option<Disposition>,
    pub cursor: usize,
    pub len: usize,
    pub complete: bool,
    pub can_undo: bool,
    pub reconciling: bool,
    pub stats: ReviewStats,
}

/// Result of calls that (re)position the session: open, refresh, jump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    Ready(ReviewSnapshot),
    Rejected(RejectReason),
}
