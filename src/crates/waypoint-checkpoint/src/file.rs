//! Durable checkpoint storage on the local filesystem
//!
//! One file per run, named `<run_id>.<ext>`, inside a single directory. Writes go
//! to a uniquely named temporary file in the same directory which is then
//! renamed over the target, so readers see either the old or the new record and
//! never a torn one.

use crate::checkpoint::Checkpoint;
use crate::error::{CheckpointError, Result};
use crate::serializer::{JsonSerializer, SerializerProtocol};
use crate::traits::CheckpointStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Checkpoint store that survives process restarts
#[derive(Debug, Clone)]
pub struct FileCheckpointStore<S: SerializerProtocol = JsonSerializer> {
    directory: PathBuf,
    serializer: S,
}

impl FileCheckpointStore<JsonSerializer> {
    /// Store JSON checkpoints under `directory`, creating it if needed
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self> {
        Self::with_serializer(directory, JsonSerializer::pretty()).await
    }
}

impl<S: SerializerProtocol> FileCheckpointStore<S> {
    /// Store checkpoints under `directory` using a custom serializer
    pub async fn with_serializer(directory: impl Into<PathBuf>, serializer: S) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).await?;
        debug!(directory = %directory.display(), "Opened file checkpoint store");
        Ok(Self {
            directory,
            serializer,
        })
    }

    /// Directory holding the checkpoint files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, run_id: &str) -> Result<PathBuf> {
        validate_run_id(run_id)?;
        Ok(self
            .directory
            .join(format!("{}.{}", run_id, self.serializer.extension())))
    }
}

/// Run ids become file names, so only a conservative character set is allowed
fn validate_run_id(run_id: &str) -> Result<()> {
    if run_id.is_empty() {
        return Err(CheckpointError::Invalid("run id must not be empty".into()));
    }
    if run_id.starts_with('.') {
        return Err(CheckpointError::Invalid(format!(
            "run id '{}' must not start with '.'",
            run_id
        )));
    }
    if let Some(c) = run_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(CheckpointError::Invalid(format!(
            "run id '{}' contains unsupported character {:?}",
            run_id, c
        )));
    }
    Ok(())
}

#[async_trait]
impl<S: SerializerProtocol> CheckpointStore for FileCheckpointStore<S> {
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        let path = self.path_for(&checkpoint.run_id)?;
        let bytes = self.serializer.dumps(&checkpoint)?;

        let temp_path = self
            .directory
            .join(format!(".{}.{}.tmp", checkpoint.run_id, Uuid::new_v4()));
        fs::write(&temp_path, &bytes).await?;
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(CheckpointError::Storage(format!(
                "Failed to move checkpoint into place at {}: {}",
                path.display(),
                e
            )));
        }

        debug!(run_id = %checkpoint.run_id, path = %path.display(), "Saved checkpoint");
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Checkpoint> {
        let path = self.path_for(run_id)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(run_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let checkpoint: Checkpoint = self.serializer.loads(&bytes)?;
        if checkpoint.run_id != run_id {
            return Err(CheckpointError::Invalid(format!(
                "file {} holds run '{}'",
                path.display(),
                checkpoint.run_id
            )));
        }
        Ok(checkpoint)
    }

    async fn delete(&self, run_id: &str) -> Result<()> {
        let path = self.path_for(run_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let suffix = format!(".{}", self.serializer.extension());
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            if let Some(run_id) = name.strip_suffix(&suffix) {
                ids.push(run_id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckpointMetadata, RunStatus};
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn checkpoint(run_id: &str, status: RunStatus) -> Checkpoint {
        let mut state = Map::new();
        state.insert("draft".into(), json!("v1"));
        state.insert("log".into(), json!(["a", "b"]));
        Checkpoint::new(
            run_id,
            Some("review".into()),
            state,
            CheckpointMetadata::new(status).with_step(2),
        )
    }

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        store.save(checkpoint("run-1", RunStatus::Suspended)).await.unwrap();

        // a second store over the same directory sees the record
        let reopened = FileCheckpointStore::open(dir.path()).await.unwrap();
        let loaded = reopened.load("run-1").await.unwrap();
        assert_eq!(loaded.status(), RunStatus::Suspended);
        assert_eq!(loaded.metadata.step, 2);
        assert_eq!(loaded.state["log"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        store.save(checkpoint("run-1", RunStatus::Running)).await.unwrap();
        store.save(checkpoint("run-1", RunStatus::Finished)).await.unwrap();

        assert_eq!(store.load("run-1").await.unwrap().status(), RunStatus::Finished);
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        assert!(store.load("ghost").await.unwrap_err().is_not_found());

        store.save(checkpoint("run-1", RunStatus::Running)).await.unwrap();
        store.delete("run-1").await.unwrap();
        store.delete("run-1").await.unwrap();
        assert!(!store.exists("run-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path().join("nested")).await.unwrap();
        for id in ["zeta", "alpha", "mid-1"] {
            store.save(checkpoint(id, RunStatus::Running)).await.unwrap();
        }
        assert_eq!(store.list().await.unwrap(), vec!["alpha", "mid-1", "zeta"]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_run_ids() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        for bad in ["", "../escape", "a/b", ".hidden", "sp ace"] {
            let err = store.load(bad).await.unwrap_err();
            assert!(matches!(err, CheckpointError::Invalid(_)), "{bad:?} gave {err}");
        }
        let err = store.save(checkpoint("a/b", RunStatus::Running)).await.unwrap_err();
        assert!(matches!(err, CheckpointError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_concurrent_saves_for_distinct_runs() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        let saves = (0..8).map(|i| store.save(checkpoint(&format!("run-{i}"), RunStatus::Running)));
        for result in futures::future::join_all(saves).await {
            result.unwrap();
        }
        assert_eq!(store.list().await.unwrap().len(), 8);
    }
}
