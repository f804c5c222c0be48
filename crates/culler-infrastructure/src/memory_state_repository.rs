//! In-memory state repository for tests and throwaway sessions.

use culler_core::error::Result;
use culler_core::state::StateRepository;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// [`StateRepository`] that forgets everything when dropped.
#[derive(Default)]
pub struct InMemoryStateRepository {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
