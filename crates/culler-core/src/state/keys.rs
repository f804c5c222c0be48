//! Fixed storage slots.

/// Id of the item last under review (Position Memory).
pub const LAST_VIEWED_ID: &str = "culler.last_viewed_id";

/// JSON snapshot of the disposition ledger.
pub const DISPOSITIONS: &str = "culler.dispositions";
