//! Position memory.
//!
//! Remembers which item was under review so a cold start resumes there.

use culler_core::item::ItemId;
use culler_core::state::{StateRepository, keys};
use std::sync::Arc;

/// Last-viewed item id in a single fixed slot. Failures are logged, never returned.
#[derive(Clone)]
pub struct PositionMemory {
    repository: Arc<dyn StateRepository>,
}

impl PositionMemory {
    pub fn new(repository: Arc<dyn StateRepository>) -> Self {
        Self { repository }
    }

    pub async fn save(&self, id: &ItemId) {
        if let Err(e) = self
            .repository
            .set(keys::LAST_VIEWED_ID, id.to_string())
            .await
        {
            tracing::warn!("[PositionMemory] Failed to save last viewed id {}: {}", id, e);
        }
    }

    pub async fn load(&self) -> Option<ItemId> {
        match self.repository.get(keys::LAST_VIEWED_ID).await {
            Ok(value) => value.filter(|id| !id.is_empty()).map(ItemId::from),
            Err(e) => {
                tracing::warn!("[PositionMemory] Failed to load last viewed id: {}", e);
                None
            }
        }
    }
}
