//! Atomic TOML file with a schema version header.
//!
//! On disk:
//!
//! ```toml
//! version = "1.0.0"
//!
//! [data]
//! # payload
//! ```
//!
//! A file whose major version differs from the reader's is refused rather
//! than half-parsed.

use culler_core::CullerError;
use fs2::FileExt;
use semver::Version;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reading or writing a versioned TOML file.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Cannot render TOML: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("File written by schema {found}, this build reads {supported}")]
    IncompatibleVersion { found: Version, supported: Version },
}

impl StorageError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<StorageError> for CullerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io { .. } => CullerError::io(err.to_string()),
            StorageError::Parse(e) => e.into(),
            StorageError::Render(e) => e.into(),
            other @ StorageError::IncompatibleVersion { .. } => CullerError::Serialization {
                format: "TOML".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: Version,
    data: T,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: &'a Version,
    data: &'a T,
}

/// A handle to a versioned TOML file.
///
/// - Writes go to a sibling tmp file, are fsynced, then renamed over the target.
/// - `update` holds an exclusive `fs2` lock across read-modify-write.
pub struct VersionedTomlFile<T> {
    path: PathBuf,
    version: Version,
    _phantom: PhantomData<T>,
}

impl<T> VersionedTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a handle that reads and writes schema `version`.
    pub fn new(path: PathBuf, version: Version) -> Self {
        Self {
            path,
            version,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the payload.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Unreadable, unparsable, or an incompatible major version
    pub fn load(&self) -> Result<Option<T>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(StorageError::io(&self.path))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope<T> = toml::from_str(&content)?;
        if envelope.version.major != self.version.major {
            return Err(StorageError::IncompatibleVersion {
                found: envelope.version,
                supported: self.version.clone(),
            });
        }

        Ok(Some(envelope.data))
    }

    /// Saves the payload atomically under this handle's version.
    pub fn save(&self, data: &T) -> Result<(), StorageError> {
        self.ensure_parent()?;

        let toml_string = toml::to_string_pretty(&EnvelopeRef {
            version: &self.version,
            data,
        })?;

        let tmp_path = self.sibling("tmp")?;
        let write_tmp = || -> std::io::Result<()> {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(toml_string.as_bytes())?;
            tmp_file.sync_all()
        };
        write_tmp().map_err(StorageError::io(&tmp_path))?;

        fs::rename(&tmp_path, &self.path).map_err(StorageError::io(&self.path))?;

        Ok(())
    }

    /// Read-modify-write under an exclusive lock.
    ///
    /// `default_value` stands in for a missing file. Nothing is written if `f` fails.
    pub fn update<F>(&self, default_value: T, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut T) -> Result<(), StorageError>,
    {
        let _lock = UpdateLock::acquire(self.sibling("lock")?)?;

        let mut data = self.load()?.unwrap_or(default_value);
        f(&mut data)?;
        self.save(&data)?;

        Ok(())
    }

    fn ensure_parent(&self) -> Result<(), StorageError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(StorageError::io(parent))
            }
            _ => Ok(()),
        }
    }

    /// Hidden helper file next to the target: `.<name>.<suffix>`.
    fn sibling(&self, suffix: &str) -> Result<PathBuf, StorageError> {
        let file_name = self.path.file_name().ok_or_else(|| StorageError::Io {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        Ok(self
            .path
            .with_file_name(format!(".{}.{}", file_name.to_string_lossy(), suffix)))
    }
}

/// Exclusive `fs2` lock held for one read-modify-write.
///
/// The lock file itself stays on disk. Removing it would let a waiter that
/// already opened the old inode proceed alongside a newcomer locking a new one.
struct UpdateLock {
    file: File,
}

impl UpdateLock {
    fn acquire(lock_path: PathBuf) -> Result<Self, StorageError> {
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(StorageError::io(parent))?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(StorageError::io(&lock_path))?;
        file.lock_exclusive().map_err(StorageError::io(&lock_path))?;
        Ok(Self { file })
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
