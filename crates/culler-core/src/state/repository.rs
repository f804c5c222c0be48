//! State repository trait.

use async_trait::async_trait;

use crate::error::Result;

/// Repository for arbitrary string values under string keys.
///
/// Writes are last-writer-wins per key. Implementations report failures as
/// errors; the application layer decides to log and carry on.
#[async_trait]
pub trait StateRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;
}
