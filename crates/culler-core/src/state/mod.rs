//! Key-value persistence port.
//!
//! The review session stores two things across restarts: the last viewed
//! item id and the disposition ledger. Both go through [`StateRepository`].

pub mod keys;
pub mod repository;

pub use repository::StateRepository;
