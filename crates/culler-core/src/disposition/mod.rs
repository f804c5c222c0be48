//! Disposition domain module.
//!
//! - `model`: the keep / delete tag
//! - `ledger`: per-item dispositions with mutual exclusion

mod ledger;
mod model;

pub use ledger::DispositionLedger;
pub use model::Disposition;
