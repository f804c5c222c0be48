//! Photo store over a local directory.
//!
//! Every image or video file below the root is an item. Its id is the path
//! relative to the root with `/` separators, its sort key the modification
//! time. Deleting moves files into a trash directory or unlinks them.

use chrono::{DateTime, Utc};
use culler_core::config::DeleteMode;
use culler_core::error::{CullerError, Result};
use culler_core::item::{DeleteOutcome, Item, ItemId, ItemStore, PermissionState, into_sequence};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

const DEFAULT_TRASH_DIR: &str = ".culler-trash";

#[derive(Debug)]
struct Layout {
    root: PathBuf,
    trash_dir: PathBuf,
    delete_mode: DeleteMode,
}

/// [`ItemStore`] backed by a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryItemStore {
    layout: Arc<Layout>,
}

impl DirectoryItemStore {
    /// # Arguments
    ///
    /// * `root` - Library directory
    /// * `delete_mode` - Trash or unlink on delete
    /// * `trash_dir` - Where trashed files go; defaults to `<root>/.culler-trash`
    pub fn new(root: impl Into<PathBuf>, delete_mode: DeleteMode, trash_dir: Option<PathBuf>) -> Self {
        let root = root.into();
        let trash_dir = trash_dir.unwrap_or_else(|| root.join(DEFAULT_TRASH_DIR));
        Self {
            layout: Arc::new(Layout {
                root,
                trash_dir,
                delete_mode,
            }),
        }
    }

    pub fn trash_dir(&self) -> &Path {
        &self.layout.trash_dir
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Layout) -> Result<T> + Send + 'static,
    {
        let layout = self.layout.clone();
        tokio::task::spawn_blocking(move || f(&layout))
            .await
            .map_err(|e| CullerError::internal(format!("Failed to join task: {}", e)))?
    }
}

impl Layout {
    fn permission(&self) -> PermissionState {
        match fs::read_dir(&self.root) {
            Ok(_) => PermissionState::Granted,
            Err(_) => PermissionState::Denied,
        }
    }

    fn scan(&self) -> Result<Vec<Item>> {
        if self.permission() == PermissionState::Denied {
            return Err(CullerError::PermissionDenied);
        }

        let mut items = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|e| {
                CullerError::store_unavailable(format!("Failed to read {}: {}", dir.display(), e))
            })?;

            for entry in entries {
                let entry = entry.map_err(|e| CullerError::store_unavailable(e.to_string()))?;
                let path = entry.path();
                if is_hidden(&path) || path == self.trash_dir {
                    continue;
                }

                let file_type = entry
                    .file_type()
                    .map_err(|e| CullerError::store_unavailable(e.to_string()))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && is_media(&path) {
                    match self.to_item(&path, &entry) {
                        Ok(item) => items.push(item),
                        Err(e) => {
                            tracing::warn!("[DirectoryItemStore] Skipping {}: {}", path.display(), e)
                        }
                    }
                }
            }
        }

        tracing::debug!(
            "[DirectoryItemStore] Listed {} items under {}",
            items.len(),
            self.root.display()
        );
        Ok(into_sequence(items))
    }

    fn to_item(&self, path: &Path, entry: &fs::DirEntry) -> std::io::Result<Item> {
        let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e.to_string()))?;
        let id = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Ok(Item::new(id, modified, path.to_string_lossy()))
    }

    /// Maps an id back to a path, refusing anything that would escape the root.
    fn resolve(&self, id: &ItemId) -> Option<PathBuf> {
        let relative = Path::new(id.as_str());
        let stays_inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !stays_inside || id.as_str().is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }

    fn delete(&self, ids: &BTreeSet<ItemId>) -> Result<DeleteOutcome> {
        if self.permission() == PermissionState::Denied {
            return Err(CullerError::store_unavailable(format!(
                "Library {} is not accessible",
                self.root.display()
            )));
        }

        let mut deleted = BTreeSet::new();
        for id in ids {
            let Some(path) = self.resolve(id) else {
                tracing::warn!("[DirectoryItemStore] Refusing to delete {}: outside library", id);
                continue;
            };
            if !path.is_file() {
                tracing::warn!("[DirectoryItemStore] {} no longer exists", id);
                continue;
            }

            let result = match self.delete_mode {
                DeleteMode::Remove => fs::remove_file(&path),
                DeleteMode::Trash => self.move_to_trash(id, &path),
            };
            match result {
                Ok(()) => {
                    deleted.insert(id.clone());
                }
                Err(e) => tracing::warn!("[DirectoryItemStore] Failed to delete {}: {}", id, e),
            }
        }

        tracing::info!(
            "[DirectoryItemStore] Deleted {}/{} items ({:?})",
            deleted.len(),
            ids.len(),
            self.delete_mode
        );
        Ok(DeleteOutcome { deleted_ids: deleted })
    }

    fn move_to_trash(&self, id: &ItemId, path: &Path) -> std::io::Result<()> {
        let mut destination = self.trash_dir.join(id.as_str());
        if destination.exists() {
            let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");
            let file_name = destination
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            destination.set_file_name(format!("{}.{}", stamp, file_name));
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        match fs::rename(path, &destination) {
            Ok(()) => Ok(()),
            // Trash on another filesystem.
            Err(_) => {
                fs::copy(path, &destination)?;
                fs::remove_file(path)
            }
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn is_media(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .map(|mime| matches!(mime.type_().as_str(), "image" | "video"))
        .unwrap_or(false)
}

#[async_trait::async_trait]
impl ItemStore for DirectoryItemStore {
    async fn permission(&self) -> PermissionState {
        self.blocking(|layout| Ok(layout.permission()))
            .await
            .unwrap_or(PermissionState::Denied)
    }

    async fn request_permission(&self) -> PermissionState {
        // Nothing to prompt for; access is whatever the filesystem allows.
        self.permission().await
    }

    async fn list_items(&self) -> Result<Vec<Item>> {
        self.blocking(|layout| layout.scan()).await
    }

    async fn delete_items(&self, ids: &BTreeSet<ItemId>) -> Result<DeleteOutcome> {
        let ids = ids.clone();
        self.blocking(move |layout| layout.delete(&ids)).await
    }
}
