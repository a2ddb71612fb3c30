//! Persisted snapshot of a run
//!
//! A [`Checkpoint`] is the `(run_id -> {cursor, state})` record the engine writes
//! after every node execution. Only the latest checkpoint per run is kept; saving
//! again under the same run id overwrites the previous record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a single checkpoint write
pub type CheckpointId = String;

/// Lifecycle status of a run as recorded in its checkpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run can make progress on the next step
    Running,
    /// A node interrupted and the run waits for an external decision
    Suspended,
    /// The run reached a finish point or a node without outgoing edges
    Finished,
    /// A node, a reducer or a router failed
    Failed,
}

impl RunStatus {
    /// Finished and failed runs never advance again
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Finished | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Suspended => "suspended",
            RunStatus::Finished => "finished",
            RunStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What caused a checkpoint to be written
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// Written before the first node ran
    Input,
    /// Written from inside the step loop
    Loop,
    /// Written when an external decision was injected on resume
    Update,
}

/// Metadata associated with a checkpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Run status at the time of the write
    pub status: RunStatus,

    /// Number of node executions that produced an update so far
    pub step: usize,

    /// The source of the checkpoint
    pub source: CheckpointSource,

    /// Failure text for failed runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Additional custom metadata
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl CheckpointMetadata {
    /// Create metadata for a run in the given status
    pub fn new(status: RunStatus) -> Self {
        Self {
            status,
            step: 0,
            source: CheckpointSource::Loop,
            error: None,
            extra: HashMap::new(),
        }
    }

    /// Set the source
    pub fn with_source(mut self, source: CheckpointSource) -> Self {
        self.source = source;
        self
    }

    /// Set the step number
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Attach the failure text
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Add custom metadata
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Snapshot of a run's graph position and state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The version of the checkpoint format (currently 1)
    pub v: u32,

    /// The ID of this write
    pub id: CheckpointId,

    /// Run identity, used as the storage key
    pub run_id: String,

    /// The node about to execute, or `None` once the run has finished
    pub cursor: Option<String>,

    /// Field values of the run state
    pub state: Map<String, Value>,

    /// Status, step and source of the write
    pub metadata: CheckpointMetadata,

    /// The timestamp of the checkpoint
    pub ts: DateTime<Utc>,
}

impl Checkpoint {
    /// Current checkpoint format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new checkpoint with a fresh id and the current time
    pub fn new(
        run_id: impl Into<String>,
        cursor: Option<String>,
        state: Map<String, Value>,
        metadata: CheckpointMetadata,
    ) -> Self {
        Self {
            v: Self::CURRENT_VERSION,
            id: Uuid::new_v4().to_string(),
            run_id: run_id.into(),
            cursor,
            state,
            metadata,
            ts: Utc::now(),
        }
    }

    /// Shorthand for `metadata.status`
    pub fn status(&self) -> RunStatus {
        self.metadata.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checkpoint_ids_are_unique() {
        let a = Checkpoint::new("run", None, Map::new(), CheckpointMetadata::new(RunStatus::Running));
        let b = Checkpoint::new("run", None, Map::new(), CheckpointMetadata::new(RunStatus::Running));
        assert_ne!(a.id, b.id);
        assert_eq!(a.v, Checkpoint::CURRENT_VERSION);
    }

    #[test]
    fn test_metadata_serializes_status_and_extra_flat() {
        let metadata = CheckpointMetadata::new(RunStatus::Suspended)
            .with_step(3)
            .with_extra("interrupted_node", json!("review"));

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["status"], "suspended");
        assert_eq!(value["step"], 3);
        assert_eq!(value["source"], "loop");
        assert_eq!(value["interrupted_node"], "review");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_status_terminality() {
        assert!(RunStatus::Finished.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Suspended.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert_eq!(RunStatus::Suspended.to_string(), "suspended");
    }
}
