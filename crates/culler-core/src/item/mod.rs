//! Item domain module.
//!
//! - `model`: reviewable items and the canonical sequence order
//! - `store`: the photo store port (`ItemStore`)

mod model;
mod store;

pub use model::{Item, ItemId, index_of, into_sequence, sequence_order};
pub use store::{DeleteOutcome, ItemStore, PermissionState};
