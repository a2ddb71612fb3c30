//! CompiledGraph struct and builder methods

use crate::graph::Graph;
use crate::visualization;
use std::fmt;
use std::sync::Arc;
use waypoint_checkpoint::CheckpointStore;

/// Compiled graph ready for execution
///
/// Cheap to clone; clones share the graph definition and the checkpoint store.
#[derive(Clone)]
pub struct CompiledGraph {
    pub(crate) graph: Arc<Graph>,
    pub(crate) checkpointer: Option<Arc<dyn CheckpointStore>>,
}

impl CompiledGraph {
    pub(crate) fn new(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
            checkpointer: None,
        }
    }

    /// Persist a checkpoint after every step into `store`
    pub fn with_checkpointer(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpointer = Some(store);
        self
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn CheckpointStore>> {
        self.checkpointer.as_ref()
    }

    /// The validated graph definition
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Render the graph as a Mermaid flowchart
    pub fn to_mermaid(&self) -> String {
        visualization::to_mermaid(&self.graph)
    }
}

impl fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("graph", &self.graph)
            .field("checkpointer", &self.checkpointer.is_some())
            .finish()
    }
}
