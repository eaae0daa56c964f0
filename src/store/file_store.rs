use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use super::{DocumentStore, ItemId, Result, StorageError};

/// Notes stored as Markdown files under a vault directory
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an id to a path inside the vault
    pub fn path_for(&self, id: &ItemId) -> Result<PathBuf> {
        let relative = Path::new(id.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if id.as_str().is_empty() || escapes {
            return Err(StorageError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Map a path inside the vault back to its id
    pub fn id_for(&self, path: &Path) -> Option<ItemId> {
        let relative = path.strip_prefix(&self.root).ok()?;
        if !is_note(relative) {
            return None;
        }
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(ItemId::new(parts.join("/")))
    }
}

/// Markdown files outside hidden directories
fn is_note(relative: &Path) -> bool {
    let hidden = relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
    !hidden && relative.extension().is_some_and(|ext| ext == "md")
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn read(&self, id: &ItemId) -> Result<String> {
        let path = self.path_for(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a sibling temp file so a failed write never leaves a
    /// half-written note behind
    async fn write(&self, id: &ItemId, text: &str) -> Result<()> {
        let path = self.path_for(id)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidId(id.to_string()))?;
        let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&temp_path, text).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ItemId>> {
        let root = self.root.clone();
        let paths = tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?;

        let mut ids: Vec<ItemId> = paths.iter().filter_map(|p| self.id_for(p)).collect();
        ids.sort();
        Ok(ids)
    }
}
