//! Ledger persistence.

use culler_core::disposition::DispositionLedger;
use culler_core::state::{StateRepository, keys};
use std::sync::Arc;

/// Stores the whole ledger as one JSON value.
///
/// Persistence is best effort: a failed write leaves the in-memory ledger
/// authoritative, a missing or unreadable value loads as an empty ledger.
#[derive(Clone)]
pub struct LedgerStore {
    repository: Arc<dyn StateRepository>,
}

impl LedgerStore {
    pub fn new(repository: Arc<dyn StateRepository>) -> Self {
        Self { repository }
    }

    pub async fn save(&self, ledger: &DispositionLedger) {
        let json = match serde_json::to_string(ledger) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("[LedgerStore] Failed to serialize ledger: {}", e);
                return;
            }
        };

        if let Err(e) = self.repository.set(keys::DISPOSITIONS, json).await {
            tracing::warn!(
                "[LedgerStore] Failed to save {} dispositions: {}",
                ledger.len(),
                e
            );
        }
    }

    pub async fn load(&self) -> DispositionLedger {
        let raw = match self.repository.get(keys::DISPOSITIONS).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return DispositionLedger::new(),
            Err(e) => {
                tracing::warn!("[LedgerStore] Failed to load dispositions: {}", e);
                return DispositionLedger::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("[LedgerStore] Ignoring unreadable dispositions: {}", e);
            DispositionLedger::new()
        })
    }
}
