//! Error types for graph construction and execution
//!
//! ```text
//! GraphError
//! ├── Validation       - compile() found a malformed graph
//! ├── DuplicateNode    - add_node() with a name already registered
//! ├── UnknownNode      - an edge or cursor names an unregistered node
//! ├── Routing          - a router returned a label missing from its table
//! ├── NodeExecution    - a node function failed (model errors land here)
//! ├── Execution        - failure raised by node-side helpers
//! ├── Model            - language-model collaborator failure
//! ├── InvalidResume    - resume on a run that is not suspended
//! ├── Interrupted      - invoke() hit an interrupt
//! ├── NotFound         - no checkpoint for the run id
//! ├── NoCheckpointer   - a store-backed operation on a graph without one
//! ├── State            - schema / reducer violations
//! ├── Checkpoint       - persistence failures
//! └── Serialization    - JSON conversion failures
//! ```
//!
//! Construction-time errors (`Validation`, `DuplicateNode`, `UnknownNode`) fail
//! fast and no partial graph is ever compiled. Run-time errors move the run to
//! [`RunStatus::Failed`](crate::RunStatus::Failed) and are returned to the caller;
//! the engine never retries a node on its own.

use crate::llm::ModelError;
use crate::state::StateError;
use serde_json::Value;
use thiserror::Error;
use waypoint_checkpoint::{CheckpointError, RunStatus};

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while building or running a graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph validation failed at compile time
    #[error("Graph validation failed: {0}")]
    Validation(String),

    /// A node with this name is already registered
    #[error("Node '{0}' is already registered")]
    DuplicateNode(String),

    /// A node name that was never registered
    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    /// A conditional router returned a label that is not in its branch table
    #[error("Routing from node '{node}' failed: label '{label}' has no branch")]
    Routing { node: String, label: String },

    /// A node function returned an error
    #[error("Node '{node}' execution failed: {error}")]
    NodeExecution { node: String, error: String },

    /// Failure raised by node-side helpers (tool plumbing, message decoding)
    #[error("Execution failed: {0}")]
    Execution(String),

    /// Language-model collaborator failure
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// `resume` was called on a run that is not waiting for a decision
    #[error("Cannot resume run '{run_id}': run is {status}, not suspended")]
    InvalidResume { run_id: String, status: RunStatus },

    /// A run suspended during `invoke`, which cannot deliver a decision
    #[error("Execution interrupted at node '{node}': {payload}")]
    Interrupted { node: String, payload: Value },

    /// No checkpoint is stored for the run
    #[error("No checkpoint found for run '{0}'")]
    NotFound(String),

    /// The operation needs a checkpoint store but none is configured
    #[error("No checkpoint store configured")]
    NoCheckpointer,

    /// State schema or reducer violation
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Persistence failure
    #[error("Checkpoint error: {0}")]
    Checkpoint(CheckpointError),

    /// JSON conversion failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CheckpointError> for GraphError {
    fn from(err: CheckpointError) -> Self {
        match err {
            CheckpointError::NotFound(run_id) => GraphError::NotFound(run_id),
            other => GraphError::Checkpoint(other),
        }
    }
}

impl GraphError {
    /// Create a node execution error
    ///
    /// ```rust
    /// use waypoint_core::GraphError;
    ///
    /// let err = GraphError::node_execution("generate_code", "model unavailable");
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Node 'generate_code' execution failed: model unavailable"
    /// );
    /// ```
    pub fn node_execution(node: impl Into<String>, error: impl Into<String>) -> Self {
        Self::NodeExecution {
            node: node.into(),
            error: error.into(),
        }
    }

    /// Create a routing error
    pub fn routing(node: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Routing {
            node: node.into(),
            label: label.into(),
        }
    }

    /// Attach a node name to an error raised inside that node
    ///
    /// Errors that already name their node are returned unchanged.
    pub fn in_node(self, node: &str) -> Self {
        match self {
            err @ GraphError::NodeExecution { .. } => err,
            err @ GraphError::Routing { .. } => err,
            other => GraphError::node_execution(node, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_not_found_maps_to_not_found() {
        let err: GraphError = CheckpointError::NotFound("run-1".into()).into();
        assert!(matches!(err, GraphError::NotFound(ref id) if id == "run-1"));

        let err: GraphError = CheckpointError::Storage("disk full".into()).into();
        assert!(matches!(err, GraphError::Checkpoint(_)));
    }

    #[test]
    fn test_model_error_names_the_node() {
        let err = GraphError::from(ModelError::MissingContent).in_node("generate_code");
        assert_eq!(
            err.to_string(),
            "Node 'generate_code' execution failed: Model error: Model response does not contain content"
        );
    }

    #[test]
    fn test_in_node_keeps_existing_node_errors() {
        let err = GraphError::node_execution("a", "boom").in_node("b");
        assert!(matches!(err, GraphError::NodeExecution { ref node, .. } if node == "a"));
    }

    #[test]
    fn test_invalid_resume_message() {
        let err = GraphError::InvalidResume {
            run_id: "r".into(),
            status: RunStatus::Finished,
        };
        assert_eq!(err.to_string(), "Cannot resume run 'r': run is finished, not suspended");
    }
}
