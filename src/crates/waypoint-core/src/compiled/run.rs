//! A single execution instance of a compiled graph

use crate::error::{GraphError, Result};
use crate::graph::NodeId;
use crate::interrupt::PendingInterrupt;
use crate::state::{RunState, DECISION_FIELD};
use serde_json::Value;
use waypoint_checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource, RunStatus};

/// One run of a graph against a specific state and identity
///
/// A run is created by [`CompiledGraph::start`](crate::CompiledGraph::start) or
/// loaded from a checkpoint, and is advanced by the graph's `step`/`stream`.
/// It owns its state exclusively; nothing is shared between runs.
#[derive(Debug)]
pub struct Run {
    pub(crate) run_id: String,
    pub(crate) cursor: Option<NodeId>,
    pub(crate) state: RunState,
    pub(crate) status: RunStatus,
    pub(crate) step: usize,
    pub(crate) pending_interrupt: Option<PendingInterrupt>,
    pub(crate) error: Option<String>,
    /// Failure detected after an update event was already handed out; returned
    /// by the next `step` call.
    pub(crate) deferred_error: Option<GraphError>,
}

impl Run {
    pub(crate) fn new(run_id: impl Into<String>, entry: &str, state: RunState) -> Self {
        Self {
            run_id: run_id.into(),
            cursor: Some(entry.to_string()),
            state,
            status: RunStatus::Running,
            step: 0,
            pending_interrupt: None,
            error: None,
            deferred_error: None,
        }
    }

    /// Opaque identity, used as the checkpoint key
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The node about to execute, `None` once finished
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn into_state(self) -> RunState {
        self.state
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Number of node executions that produced an update
    pub fn step(&self) -> usize {
        self.step
    }

    /// The interrupt this run waits on
    ///
    /// Only set in the process that observed the interrupt; payloads are not
    /// written to checkpoints, so a run loaded from storage reports `None` here
    /// while its status is still [`RunStatus::Suspended`].
    pub fn pending_interrupt(&self) -> Option<&PendingInterrupt> {
        self.pending_interrupt.as_ref()
    }

    /// Failure text of a failed run
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Snapshot this run for persistence
    pub fn to_checkpoint(&self, source: CheckpointSource) -> Checkpoint {
        let mut metadata = CheckpointMetadata::new(self.status)
            .with_step(self.step)
            .with_source(source);
        if let Some(error) = &self.error {
            metadata = metadata.with_error(error.clone());
        }
        if let Some(pending) = &self.pending_interrupt {
            metadata = metadata
                .with_extra("interrupted_node", Value::String(pending.node.clone()))
                .with_extra("interrupt_id", Value::String(pending.interrupt_id.clone()));
        }
        Checkpoint::new(
            self.run_id.clone(),
            self.cursor.clone(),
            self.state.as_map().clone(),
            metadata,
        )
    }

    /// Rebuild a run from its checkpoint
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            run_id: checkpoint.run_id,
            cursor: checkpoint.cursor,
            state: RunState::from(checkpoint.state),
            status: checkpoint.metadata.status,
            step: checkpoint.metadata.step,
            pending_interrupt: None,
            error: checkpoint.metadata.error,
            deferred_error: None,
        }
    }

    /// Inject an external decision into a suspended run
    pub(crate) fn inject_decision(&mut self, value: Value) -> Result<()> {
        if self.status != RunStatus::Suspended {
            return Err(GraphError::InvalidResume {
                run_id: self.run_id.clone(),
                status: self.status,
            });
        }
        self.state.set(DECISION_FIELD, value);
        self.status = RunStatus::Running;
        self.pending_interrupt = None;
        Ok(())
    }

    pub(crate) fn clear_decision(&mut self) {
        if self.state.decision().is_some() {
            self.state.set(DECISION_FIELD, Value::Null);
        }
    }

    pub(crate) fn suspend(&mut self, pending: PendingInterrupt) {
        self.status = RunStatus::Suspended;
        self.pending_interrupt = Some(pending);
    }

    pub(crate) fn fail(&mut self, error: &GraphError) {
        self.status = RunStatus::Failed;
        self.error = Some(error.to_string());
    }

    pub(crate) fn finish(&mut self) {
        self.status = RunStatus::Finished;
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checkpoint_round_trip_keeps_position_and_state() {
        let mut run = Run::new("run-1", "review", RunState::new().with("draft", "v1"));
        run.step = 2;
        run.suspend(PendingInterrupt::new("review", json!({"review": "v1"})));

        let checkpoint = run.to_checkpoint(CheckpointSource::Loop);
        assert_eq!(checkpoint.metadata.extra["interrupted_node"], "review");

        let restored = Run::from_checkpoint(checkpoint);
        assert_eq!(restored.run_id(), "run-1");
        assert_eq!(restored.cursor(), Some("review"));
        assert_eq!(restored.status(), RunStatus::Suspended);
        assert_eq!(restored.step(), 2);
        assert_eq!(restored.state().get_str("draft"), Some("v1"));
        assert!(restored.pending_interrupt().is_none());
    }

    #[test]
    fn test_inject_decision_requires_suspension() {
        let mut run = Run::new("run-1", "a", RunState::new());
        let err = run.inject_decision(json!("approve")).unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidResume { status: RunStatus::Running, .. }
        ));

        run.suspend(PendingInterrupt::new("a", json!(null)));
        run.inject_decision(json!("approve")).unwrap();
        assert_eq!(run.status(), RunStatus::Running);
        assert_eq!(run.state().decision(), Some(&json!("approve")));

        run.clear_decision();
        assert!(run.state().decision().is_none());
    }

    #[test]
    fn test_failed_run_records_error() {
        let mut run = Run::new("run-1", "a", RunState::new());
        run.fail(&GraphError::routing("a", "nope"));
        assert!(run.is_terminal());
        assert!(run.error().unwrap().contains("label 'nope'"));
        assert_eq!(
            run.to_checkpoint(CheckpointSource::Loop).metadata.error.as_deref(),
            run.error()
        );
    }
}
