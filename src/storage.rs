//! Seen-state persistence.
//!
//! The state file is a single JSON object mapping record identities to
//! seen entries. It is the only durable state the watcher keeps.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::SeenSet;

/// File-backed store for the seen-state.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the seen-state.
    ///
    /// A missing file yields an empty set. So does a file that exists but
    /// cannot be parsed: losing the dedup history means duplicate
    /// notifications, which beats never notifying again.
    pub async fn load(&self) -> Result<SeenSet> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No state file at {}, starting empty", self.path.display());
                return Ok(SeenSet::new());
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        match serde_json::from_slice(&bytes) {
            Ok(set) => Ok(set),
            Err(e) => {
                log::warn!(
                    "State file {} is unreadable ({e}), starting empty",
                    self.path.display()
                );
                Ok(SeenSet::new())
            }
        }
    }

    /// Persist the seen-state atomically (write to temp, then rename).
    pub async fn save(&self, set: &SeenSet) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(set)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeenEntry;
    use tempfile::TempDir;

    fn store_in(tmp: &TempDir) -> StateStore {
        StateStore::new(tmp.path().join("processed.json"))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let set = store.load().await.unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let mut set = SeenSet::new();
        set.record("id-b", SeenEntry::new("second"));
        set.record("id-a", SeenEntry::new("first"));
        store.save(&set).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        let ids: Vec<&str> = loaded.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["id-b", "id-a"]);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        tokio::fs::write(store.path(), b"{not json at all")
            .await
            .unwrap();
        let set = store.load().await.unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn save_creates_missing_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("nested/dir/processed.json"));

        store.save(&SeenSet::new()).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file_behind() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        store.save(&SeenSet::new()).await.unwrap();
        assert!(!tmp.path().join("processed.tmp").exists());
    }

    #[tokio::test]
    async fn save_overwrites_previous_state() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let mut set = SeenSet::new();
        set.record("id-a", SeenEntry::new("first"));
        store.save(&set).await.unwrap();

        set.record("id-b", SeenEntry::new("second"));
        store.save(&set).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
    }
}
