//! Unified path management for culler files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/culler/            # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/culler/       # Data directory
//! └── logs/                    # Application logs
//!     └── culler.log.YYYY-MM-DD
//!
//! <library>/                   # Any reviewed directory
//! ├── .culler-state.toml       # Last viewed item, dispositions
//! └── .culler-trash/           # Default trash for deleted items
//! ```
//!
//! Review state lives next to the photos because item ids are paths
//! relative to the library root.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "culler";
const LIBRARY_STATE_FILE: &str = ".culler-state.toml";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for culler_core::CullerError {
    fn from(err: PathError) -> Self {
        culler_core::CullerError::config(err.to_string())
    }
}

/// Platform paths for culler, resolved with the `dirs` crate.
pub struct CullerPaths;

impl CullerPaths {
    /// Returns the culler configuration directory (e.g. `~/.config/culler/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the culler data directory (e.g. `~/.local/share/culler/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the review state file for the library at `library`.
    pub fn library_state_file(library: &Path) -> PathBuf {
        library.join(LIBRARY_STATE_FILE)
    }

    /// Returns the logs directory.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("logs"))
    }
}
