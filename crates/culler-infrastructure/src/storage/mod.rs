//! Storage layer for atomic, versioned file operations.

mod versioned_toml;

pub use versioned_toml::{StorageError, VersionedTomlFile};
