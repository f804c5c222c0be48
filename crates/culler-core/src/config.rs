//! Application configuration.
//!
//! Loaded from `config.toml`; every field has a default so a partial or
//! missing file is valid.

use crate::review::HistoryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CullerConfig {
    pub review: ReviewConfig,
    pub library: LibraryConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReviewConfig {
    /// How undo history survives a commit.
    pub history_policy: HistoryPolicy,
    /// Number of items after the current one the presentation should prefetch.
    pub lookahead: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            history_policy: HistoryPolicy::Reindex,
            lookahead: 2,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Move files into the trash directory.
    #[default]
    Trash,
    /// Unlink files.
    Remove,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    pub delete_mode: DeleteMode,
    /// Defaults to `<library>/.culler-trash`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trash_dir: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `culler_application=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
