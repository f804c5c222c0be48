//! Configuration loading.

use crate::paths::CullerPaths;
use culler_core::config::CullerConfig;
use culler_core::error::{CullerError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Reads `config.toml`, writing the defaults out on first run.
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Uses the platform default location.
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::new(CullerPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration.
    ///
    /// A missing file yields the defaults, which are then written so users
    /// have something to edit. Failing to write them is only logged.
    /// A file that does not parse is a `Config` error.
    pub fn load(&self) -> Result<CullerConfig> {
        if !self.path.exists() {
            let config = CullerConfig::default();
            if let Err(e) = self.save(&config) {
                tracing::warn!(
                    "[ConfigService] Could not write default config to {}: {}",
                    self.path.display(),
                    e
                );
            }
            return Ok(config);
        }

        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            CullerError::config(format!("Invalid config {}: {}", self.path.display(), e))
        })
    }

    pub fn save(&self, config: &CullerConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string_pretty(config)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use culler_core::review::HistoryPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_first_load_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("culler/config.toml"));

        let config = service.load().unwrap();

        assert_eq!(config, CullerConfig::default());
        assert!(service.path().exists());
        assert_eq!(service.load().unwrap(), config);
    }

    #[test]
    fn test_reads_user_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[review]\nhistory_policy = \"drop\"\nlookahead = 5\n").unwrap();

        let config = ConfigService::new(path).load().unwrap();

        assert_eq!(config.review.history_policy, HistoryPolicy::Drop);
        assert_eq!(config.review.lookahead, 5);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[review\nlookahead = ").unwrap();

        let err = ConfigService::new(path).load().unwrap_err();
        assert!(matches!(err, CullerError::Config(_)));
    }
}
