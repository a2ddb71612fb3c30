//! # waypoint-checkpoint - Run persistence for waypoint graphs
//!
//! Checkpoints are **snapshots of a run's graph position and state**, written by
//! the engine after every node execution. They make suspend/resume work across
//! process boundaries: a run that suspends in one process can be loaded and
//! resumed by a later, unrelated one.
//!
//! ## Core Types
//!
//! - [`Checkpoint`] - `{run_id, cursor, state, metadata}` record
//! - [`CheckpointStore`] - async key-value trait keyed by run id
//! - [`InMemoryCheckpointStore`] - `Arc<RwLock<HashMap>>` backend for tests and single processes
//! - [`FileCheckpointStore`] - one file per run, atomic temp-file-and-rename writes
//! - [`SerializerProtocol`] / [`JsonSerializer`] - encoding used by file-backed stores
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waypoint_checkpoint::{
//!     Checkpoint, CheckpointMetadata, CheckpointStore, InMemoryCheckpointStore, RunStatus,
//! };
//!
//! # async fn demo() -> waypoint_checkpoint::Result<()> {
//! let store = InMemoryCheckpointStore::new();
//! let checkpoint = Checkpoint::new(
//!     "run-42",
//!     Some("review".to_string()),
//!     serde_json::Map::new(),
//!     CheckpointMetadata::new(RunStatus::Suspended),
//! );
//! store.save(checkpoint).await?;
//!
//! let loaded = store.load("run-42").await?;
//! assert_eq!(loaded.status(), RunStatus::Suspended);
//! # Ok(())
//! # }
//! ```
//!
//! Only the latest checkpoint of each run is kept. There is no history, no
//! expiry and no locking beyond last-write-wins per run id.

pub mod checkpoint;
pub mod error;
pub mod file;
pub mod memory;
pub mod serializer;
pub mod traits;

pub use checkpoint::{Checkpoint, CheckpointId, CheckpointMetadata, CheckpointSource, RunStatus};
pub use error::{CheckpointError, Result};
pub use file::FileCheckpointStore;
pub use memory::InMemoryCheckpointStore;
pub use serializer::{JsonSerializer, SerializerProtocol};
pub use traits::CheckpointStore;
