//! Checkpoint persistence.
//!
//! The whole mapping is rewritten after every page. Writes go to a sibling
//! temp file which is then renamed over the target, so a reader never sees
//! a half-written checkpoint. A single mutex covers mutate-then-persist for
//! every project, so concurrent loops cannot lose each other's updates.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Checkpoint, ProjectCheckpoint};

/// Shared, serialized checkpoint store.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    state: Mutex<Checkpoint>,
}

impl CheckpointStore {
    /// Load the checkpoint at `path`, starting empty if it is missing or corrupt.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load_checkpoint(&path).await;
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, project: &str) -> ProjectCheckpoint {
        self.state.lock().await.get(project)
    }

    /// Record `entry` for `project` and persist the full mapping.
    pub async fn update(&self, project: &str, entry: ProjectCheckpoint) -> Result<()> {
        let mut state = self.state.lock().await;
        state.set(project, entry);
        save_checkpoint(&self.path, &state).await
    }

    /// Drop the entries for `projects`, returning how many existed.
    pub async fn reset(&self, projects: &[String]) -> Result<usize> {
        let mut state = self.state.lock().await;
        let removed = projects
            .iter()
            .filter(|p| state.remove(p).is_some())
            .count();
        save_checkpoint(&self.path, &state).await?;
        Ok(removed)
    }

    /// Persist the current mapping.
    pub async fn flush(&self) -> Result<()> {
        let state = self.state.lock().await;
        save_checkpoint(&self.path, &state).await
    }
}

/// Read a checkpoint file. Never fails: absent or unreadable files yield an
/// empty checkpoint.
pub async fn load_checkpoint(path: &Path) -> Checkpoint {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No checkpoint at {}, starting fresh", path.display());
            return Checkpoint::new();
        }
        Err(e) => {
            log::warn!(
                "Checkpoint {} unreadable ({}), starting fresh",
                path.display(),
                e
            );
            return Checkpoint::new();
        }
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        log::warn!(
            "Checkpoint {} is corrupt ({}), starting fresh",
            path.display(),
            e
        );
        Checkpoint::new()
    })
}

/// Overwrite the checkpoint file atomically (write to temp, then rename).
pub async fn save_checkpoint(path: &Path, checkpoint: &Checkpoint) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bytes = serde_json::to_vec_pretty(checkpoint)?;
    let tmp = temp_path(path)?;
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| AppError::config(format!("checkpoint path {path:?} has no file name")))?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(last_start_at: u64, completed: bool) -> ProjectCheckpoint {
        ProjectCheckpoint {
            last_start_at,
            completed,
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let checkpoint = load_checkpoint(&tmp.path().join("nope.json")).await;
        assert!(checkpoint.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("checkpoint.json");
        tokio::fs::write(&path, b"{\"HADOOP\": {\"last_sta").await.unwrap();

        let store = CheckpointStore::open(&path).await;
        assert_eq!(store.get("HADOOP").await, ProjectCheckpoint::default());
    }

    #[tokio::test]
    async fn test_update_persists_and_reloads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state/checkpoint.json");

        let store = CheckpointStore::open(&path).await;
        store.update("HADOOP", entry(100, false)).await.unwrap();
        store.update("KAFKA", entry(50, true)).await.unwrap();

        let reloaded = load_checkpoint(&path).await;
        assert_eq!(reloaded.get("HADOOP"), entry(100, false));
        assert_eq!(reloaded.get("KAFKA"), entry(50, true));
        assert!(!path.with_file_name("checkpoint.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("checkpoint.json");
        let store = Arc::new(CheckpointStore::open(&path).await);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for page in 1..=5u64 {
                        store
                            .update(&format!("P{i}"), entry(page * 10, page == 5))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let reloaded = load_checkpoint(&path).await;
        assert_eq!(reloaded.len(), 8);
        for i in 0..8 {
            assert_eq!(reloaded.get(&format!("P{i}")), entry(50, true));
        }
    }

    #[tokio::test]
    async fn test_reset_removes_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("checkpoint.json");
        let store = CheckpointStore::open(&path).await;
        store.update("A", entry(10, true)).await.unwrap();
        store.update("B", entry(20, false)).await.unwrap();

        let removed = store
            .reset(&["A".to_string(), "MISSING".to_string()])
            .await
            .unwrap();

        assert_eq!(removed, 1);
        let reloaded = load_checkpoint(&path).await;
        assert_eq!(reloaded.get("A"), ProjectCheckpoint::default());
        assert_eq!(reloaded.get("B"), entry(20, false));
    }
}
