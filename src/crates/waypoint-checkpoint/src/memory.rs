//! In-memory checkpoint storage
//!
//! [`InMemoryCheckpointStore`] keeps the latest checkpoint of every run in a
//! `HashMap` behind an `Arc<RwLock<..>>`. It is enough for single-process use and
//! for tests; anything that must survive a restart should use
//! [`FileCheckpointStore`](crate::FileCheckpointStore) or a custom backend.
//!
//! Cloning the store is cheap and every clone shares the same map, so one store
//! can be handed to several compiled graphs.

use crate::checkpoint::Checkpoint;
use crate::error::{CheckpointError, Result};
use crate::traits::CheckpointStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory checkpoint store
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    storage: Arc<RwLock<HashMap<String, Checkpoint>>>,
}

impl InMemoryCheckpointStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs with a stored checkpoint
    pub async fn run_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Drop every stored checkpoint
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        let mut storage = self.storage.write().await;
        storage.insert(checkpoint.run_id.clone(), checkpoint);
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Checkpoint> {
        let storage = self.storage.read().await;
        storage
            .get(run_id)
            .cloned()
            .ok_or_else(|| CheckpointError::NotFound(run_id.to_string()))
    }

    async fn delete(&self, run_id: &str) -> Result<()> {
        self.storage.write().await.remove(run_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let storage = self.storage.read().await;
        let mut ids: Vec<String> = storage.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckpointMetadata, RunStatus};
    use serde_json::{json, Map};

    fn checkpoint(run_id: &str, draft: &str) -> Checkpoint {
        let mut state = Map::new();
        state.insert("draft".into(), json!(draft));
        Checkpoint::new(
            run_id,
            Some("review".into()),
            state,
            CheckpointMetadata::new(RunStatus::Running),
        )
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemoryCheckpointStore::new();
        store.save(checkpoint("run-1", "v1")).await.unwrap();

        let loaded = store.load("run-1").await.unwrap();
        assert_eq!(loaded.state["draft"], "v1");
        assert_eq!(loaded.cursor.as_deref(), Some("review"));
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let store = InMemoryCheckpointStore::new();
        let err = store.load("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = InMemoryCheckpointStore::new();
        store.save(checkpoint("run-1", "v1")).await.unwrap();
        store.save(checkpoint("run-1", "v2")).await.unwrap();

        assert_eq!(store.run_count().await, 1);
        assert_eq!(store.load("run-1").await.unwrap().state["draft"], "v2");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryCheckpointStore::new();
        store.save(checkpoint("run-1", "v1")).await.unwrap();
        store.delete("run-1").await.unwrap();
        store.delete("run-1").await.unwrap();
        assert!(store.load("run-1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let store = InMemoryCheckpointStore::new();
        let other = store.clone();
        store.save(checkpoint("b", "x")).await.unwrap();
        other.save(checkpoint("a", "y")).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a", "b"]);
        store.clear().await;
        assert_eq!(other.run_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_saves_for_distinct_runs() {
        let store = InMemoryCheckpointStore::new();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.save(checkpoint(&format!("run-{i}"), "v")).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.run_count().await, 16);
    }
}
