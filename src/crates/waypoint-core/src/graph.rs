//! Graph model: nodes, edges and routing
//!
//! A [`Graph`] is produced by [`StateGraph::compile`](crate::StateGraph::compile)
//! and is immutable afterwards. Every node has at most one unconditional edge and
//! at most one conditional edge; when both exist the conditional edge decides.
//! [`END`] is a valid target meaning "the run finishes here".

use crate::error::{GraphError, Result};
use crate::node_result::NodeOutput;
use crate::state::{RunState, StateSchema};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Node identifier type
pub type NodeId = String;

/// Pseudo-node that terminates a run when used as an edge target
pub const END: &str = "__end__";

/// Boxed future returned by node executors
pub type NodeFuture = Pin<Box<dyn Future<Output = Result<NodeOutput>> + Send>>;

/// Node executor function type
pub type NodeExecutor = Arc<dyn Fn(RunState) -> NodeFuture + Send + Sync>;

/// Router for a conditional edge: inspects the post-merge state and names a branch
pub type RouterFn = Arc<dyn Fn(&RunState) -> String + Send + Sync>;

/// Registered node
#[derive(Clone)]
pub struct NodeSpec {
    /// Node name
    pub name: NodeId,

    /// Node executor
    pub executor: NodeExecutor,
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("executor", &"<function>")
            .finish()
    }
}

/// Conditional edge: a router plus its label → target table
#[derive(Clone)]
pub struct ConditionalEdge {
    pub router: RouterFn,
    pub branches: BTreeMap<String, NodeId>,
}

impl ConditionalEdge {
    /// Run the router and look up its label
    ///
    /// Returns `Ok(None)` when the branch leads to [`END`].
    pub fn resolve(&self, from: &str, state: &RunState) -> Result<Option<NodeId>> {
        let label = (self.router)(state);
        match self.branches.get(&label) {
            Some(target) if target == END => Ok(None),
            Some(target) => Ok(Some(target.clone())),
            None => Err(GraphError::routing(from, label)),
        }
    }
}

impl fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("router", &"<function>")
            .field("branches", &self.branches)
            .finish()
    }
}

/// Outgoing edges of one node
#[derive(Debug, Clone, Default)]
pub struct Edges {
    pub direct: Option<NodeId>,
    pub conditional: Option<ConditionalEdge>,
}

impl Edges {
    pub fn is_empty(&self) -> bool {
        self.direct.is_none() && self.conditional.is_none()
    }
}

/// A validated, executable graph
#[derive(Clone)]
pub struct Graph {
    pub(crate) nodes: HashMap<NodeId, NodeSpec>,
    /// Registration order, used for stable rendering
    pub(crate) order: Vec<NodeId>,
    pub(crate) edges: HashMap<NodeId, Edges>,
    pub(crate) entry: NodeId,
    pub(crate) finish_points: BTreeSet<NodeId>,
    pub(crate) schema: StateSchema,
}

impl Graph {
    /// The node every run starts at
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Node names in registration order
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn edges_from(&self, name: &str) -> Option<&Edges> {
        self.edges.get(name)
    }

    pub fn finish_points(&self) -> impl Iterator<Item = &str> {
        self.finish_points.iter().map(String::as_str)
    }

    pub fn is_finish_point(&self, name: &str) -> bool {
        self.finish_points.contains(name)
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// Where a run goes after `from` produced an update
    ///
    /// `Ok(None)` means the run is finished: `from` is a finish point, it has no
    /// outgoing edge, or its edge leads to [`END`].
    pub fn next_node(&self, from: &str, state: &RunState) -> Result<Option<NodeId>> {
        if self.finish_points.contains(from) {
            return Ok(None);
        }
        let Some(edges) = self.edges.get(from) else {
            return Ok(None);
        };
        if let Some(conditional) = &edges.conditional {
            return conditional.resolve(from, state);
        }
        match &edges.direct {
            Some(target) if target == END => Ok(None),
            Some(target) => Ok(Some(target.clone())),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.order)
            .field("edges", &self.edges)
            .field("entry", &self.entry)
            .field("finish_points", &self.finish_points)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(label: &'static str) -> RouterFn {
        Arc::new(move |_| label.to_string())
    }

    fn conditional(label: &'static str) -> ConditionalEdge {
        let mut branches = BTreeMap::new();
        branches.insert("again".to_string(), "produce".to_string());
        branches.insert("done".to_string(), END.to_string());
        ConditionalEdge {
            router: router(label),
            branches,
        }
    }

    #[test]
    fn test_conditional_resolution() {
        let state = RunState::new();
        assert_eq!(
            conditional("again").resolve("review", &state).unwrap(),
            Some("produce".to_string())
        );
        assert_eq!(conditional("done").resolve("review", &state).unwrap(), None);
    }

    #[test]
    fn test_unknown_label_is_a_routing_error() {
        let err = conditional("maybe")
            .resolve("review", &RunState::new())
            .unwrap_err();
        match err {
            GraphError::Routing { node, label } => {
                assert_eq!(node, "review");
                assert_eq!(label, "maybe");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_debug_hides_functions() {
        let rendered = format!("{:?}", conditional("done"));
        assert!(rendered.contains("<function>"));
        assert!(rendered.contains("produce"));
    }
}
