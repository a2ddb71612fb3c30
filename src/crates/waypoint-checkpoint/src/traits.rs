//! Storage trait for checkpoint backends
//!
//! The engine treats a [`CheckpointStore`] as a plain key-value store keyed by
//! run id. Backends must be safe under concurrent calls for *different* run ids;
//! for the same run id the last write wins and nothing stronger is promised.
//!
//! ```text
//! CompiledGraph ──save()──▶ CheckpointStore ──▶ memory / files / your backend
//!       ▲                        │
//!       └────────load()──────────┘   (resume in a later process)
//! ```
//!
//! # Implementing a backend
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use waypoint_checkpoint::{Checkpoint, CheckpointStore, Result};
//!
//! struct RedisStore { /* ... */ }
//!
//! #[async_trait]
//! impl CheckpointStore for RedisStore {
//!     async fn save(&self, checkpoint: Checkpoint) -> Result<()> { todo!() }
//!     async fn load(&self, run_id: &str) -> Result<Checkpoint> { todo!() }
//!     async fn delete(&self, run_id: &str) -> Result<()> { todo!() }
//!     async fn list(&self) -> Result<Vec<String>> { todo!() }
//! }
//! ```

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use async_trait::async_trait;

/// Keyed persistence of run checkpoints
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Store `checkpoint` under its `run_id`, replacing any previous record
    async fn save(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Load the latest checkpoint for `run_id`
    ///
    /// Returns [`CheckpointError::NotFound`](crate::CheckpointError::NotFound)
    /// when nothing is stored for the run.
    async fn load(&self, run_id: &str) -> Result<Checkpoint>;

    /// Remove the checkpoint for `run_id`. Deleting a missing run is not an error.
    async fn delete(&self, run_id: &str) -> Result<()>;

    /// Run ids with a stored checkpoint, sorted
    async fn list(&self) -> Result<Vec<String>>;

    /// Whether a checkpoint exists for `run_id`
    async fn exists(&self, run_id: &str) -> Result<bool> {
        match self.load(run_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
