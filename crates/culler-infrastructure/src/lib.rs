//! Adapters for culler: filesystem photo store, key-value state files,
//! configuration loading and platform paths.

pub mod config_service;
pub mod directory_item_store;
pub mod memory_state_repository;
pub mod paths;
pub mod storage;
pub mod toml_state_repository;

pub use crate::config_service::ConfigService;
pub use crate::directory_item_store::DirectoryItemStore;
pub use crate::memory_state_repository::InMemoryStateRepository;
pub use crate::paths::CullerPaths;
pub use crate::toml_state_repository::TomlStateRepository;
