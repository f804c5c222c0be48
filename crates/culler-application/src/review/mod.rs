//! Review application services.
//!
//! - `session`: the async review session (`ReviewSession`)
//! - `position`: last-viewed item persistence (`PositionMemory`)
//! - `ledger_store`: disposition ledger persistence (`LedgerStore`)

mod ledger_store;
mod position;
mod session;

pub use ledger_store::LedgerStore;
pub use position::PositionMemory;
pub use session::ReviewSession;
