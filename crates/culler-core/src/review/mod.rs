//! Review domain module.
//!
//! # Module Structure
//!
//! - `state`: the cursor / ledger / history state machine (`ReviewState`)
//! - `history`: undo stack and its re-anchoring policy
//! - `reconcile`: target-id capture and resolution across a sequence swap
//! - `outcome`: explicit results of every operation
//! - `event`: notifications for the presentation layer

mod event;
mod history;
mod outcome;
mod reconcile;
mod state;

pub use event::SessionEvent;
pub use history::{History, HistoryEntry, HistoryPolicy};
pub use outcome::{
    CommitOutcome, CommitReport, RejectReason, ReviewSnapshot, ReviewStats, TagOutcome,
    UndoOutcome, ViewOutcome,
};
pub use reconcile::{resolve_cursor, target_id};
pub use state::{CommitPlan, ReviewState};
