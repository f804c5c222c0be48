//! File-backed state repository.
//!
//! Keeps every key in one versioned TOML file and caches the map in memory
//! so reads never touch the disk after startup.

use crate::paths::CullerPaths;
use crate::storage::VersionedTomlFile;
use culler_core::error::{CullerError, Result};
use culler_core::state::StateRepository;
use semver::Version;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Schema version written into the state file.
const STATE_FILE_VERSION: Version = Version::new(1, 0, 0);

type StateMap = BTreeMap<String, String>;

/// [`StateRepository`] persisted to a TOML file, one per library.
///
/// Writes are read-modify-write under a file lock, so two processes setting
/// different keys do not clobber each other. Same-key writes are
/// last-writer-wins.
#[derive(Clone)]
pub struct TomlStateRepository {
    /// Cached state loaded from storage.
    cache: Arc<Mutex<StateMap>>,
    file: Arc<VersionedTomlFile<StateMap>>,
}

impl TomlStateRepository {
    /// Opens the state file belonging to the library at `library`.
    pub async fn for_library(library: &Path) -> Result<Self> {
        Self::open(CullerPaths::library_state_file(library)).await
    }

    /// Opens (without creating) the state file at `path` and loads it.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let file = Arc::new(VersionedTomlFile::<StateMap>::new(path, STATE_FILE_VERSION));

        let loader = file.clone();
        let initial = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| CullerError::internal(format!("Failed to join task: {}", e)))??
            .unwrap_or_default();

        tracing::debug!(
            "[TomlStateRepository] Loaded {} keys from {}",
            initial.len(),
            file.path().display()
        );

        Ok(Self {
            cache: Arc::new(Mutex::new(initial)),
            file,
        })
    }
}

#[async_trait::async_trait]
impl StateRepository for TomlStateRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        // Update in-memory cache first
        self.cache
            .lock()
            .await
            .insert(key.to_string(), value.clone());

        let file = self.file.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            file.update(StateMap::new(), |map| {
                map.insert(key, value);
                Ok(())
            })
        })
        .await
        .map_err(|e| CullerError::internal(format!("Failed to join task: {}", e)))?
        .map_err(|e| CullerError::persistence(format!("Failed to save state: {}", e)))
    }
}
