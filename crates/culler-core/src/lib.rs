//! Domain layer for culler.
//!
//! Holds the item and disposition models, the review state machine with its
//! post-commit reconciliation, and the port traits the outer layers implement.

pub mod config;
pub mod disposition;
pub mod error;
pub mod item;
pub mod review;
pub mod state;

// Re-export common error type
pub use error::CullerError;
