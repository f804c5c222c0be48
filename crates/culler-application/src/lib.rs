//! Application layer for culler.
//!
//! Coordinates the review state machine with the photo store and the
//! key-value state repository.

pub mod review;

pub use review::{LedgerStore, PositionMemory, ReviewSession};
