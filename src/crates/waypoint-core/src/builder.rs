//! StateGraph builder API
//!
//! [`StateGraph`] collects nodes, edges and entry/finish points against a declared
//! [`StateSchema`], then [`compile`](StateGraph::compile)s them into an immutable
//! [`CompiledGraph`].
//!
//! ```text
//! StateGraph::new(schema)
//!     .add_node("produce", ..)?      DuplicateNode if the name is taken
//!     .add_node("review", ..)?
//!     .add_edge("produce", "review")?            UnknownNode if an endpoint is missing
//!     .add_conditional_edge("review", router, [("approve", END), ("reject", "produce")])?
//!     .set_entry_point("produce");
//! graph.compile()?                   Validation error naming the first violation
//! ```
//!
//! Nodes must be registered before edges that mention them.
//!
//! # Example
//!
//! ```rust
//! use waypoint_core::{PartialUpdate, StateGraph, StateSchema, END};
//!
//! # fn build() -> waypoint_core::Result<()> {
//! let schema = StateSchema::new().text("greeting")?;
//! let mut graph = StateGraph::new(schema);
//! graph
//!     .add_node("greet", |_state| async {
//!         Ok(PartialUpdate::new().set("greeting", "hello").into())
//!     })?
//!     .add_edge("greet", END)?
//!     .set_entry_point("greet");
//!
//! let compiled = graph.compile()?;
//! assert_eq!(compiled.graph().entry(), "greet");
//! # Ok(())
//! # }
//! ```

use crate::compiled::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::graph::{
    ConditionalEdge, Edges, Graph, NodeExecutor, NodeFuture, NodeId, NodeSpec, END,
};
use crate::node_result::NodeOutput;
use crate::state::{RunState, StateSchema, RESERVED_PREFIX};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use waypoint_checkpoint::CheckpointStore;

/// Builder for workflow graphs
pub struct StateGraph {
    schema: StateSchema,
    nodes: HashMap<NodeId, NodeSpec>,
    order: Vec<NodeId>,
    direct_edges: Vec<(NodeId, NodeId)>,
    conditional_edges: Vec<(NodeId, ConditionalEdge)>,
    entry_points: Vec<NodeId>,
    finish_points: Vec<NodeId>,
}

impl StateGraph {
    /// Create an empty graph over `schema`
    pub fn new(schema: StateSchema) -> Self {
        Self {
            schema,
            nodes: HashMap::new(),
            order: Vec::new(),
            direct_edges: Vec::new(),
            conditional_edges: Vec::new(),
            entry_points: Vec::new(),
            finish_points: Vec::new(),
        }
    }

    /// The schema the graph was created with
    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// Register a node
    ///
    /// The executor receives a snapshot of the run state and returns either an
    /// update or an interrupt.
    ///
    /// # Errors
    ///
    /// [`GraphError::DuplicateNode`] if `name` is taken, [`GraphError::Validation`]
    /// if it uses the engine's reserved `__` prefix.
    pub fn add_node<F, Fut>(&mut self, name: impl Into<NodeId>, func: F) -> Result<&mut Self>
    where
        F: Fn(RunState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NodeOutput>> + Send + 'static,
    {
        let executor: NodeExecutor =
            Arc::new(move |state: RunState| -> NodeFuture { Box::pin(func(state)) });
        self.add_node_with_executor(name, executor)
    }

    /// Register a node from an already boxed executor
    pub fn add_node_with_executor(
        &mut self,
        name: impl Into<NodeId>,
        executor: NodeExecutor,
    ) -> Result<&mut Self> {
        let name = name.into();
        if name.is_empty() || name.starts_with(RESERVED_PREFIX) {
            return Err(GraphError::Validation(format!(
                "node name '{}' is reserved",
                name
            )));
        }
        if self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateNode(name));
        }
        debug!(node = %name, "Registered node");
        self.order.push(name.clone());
        self.nodes.insert(name.clone(), NodeSpec { name, executor });
        Ok(self)
    }

    /// Add an unconditional transition; `to` may be [`END`]
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Result<&mut Self> {
        let from = from.into();
        let to = to.into();
        self.require_node(&from)?;
        self.require_target(&to)?;
        self.direct_edges.push((from, to));
        Ok(self)
    }

    /// Add a routed transition
    ///
    /// At run time `router` is called with the post-merge state; its label must
    /// be a key of `branches` or the run fails with [`GraphError::Routing`].
    pub fn add_conditional_edge<R, I, L, T>(
        &mut self,
        from: impl Into<NodeId>,
        router: R,
        branches: I,
    ) -> Result<&mut Self>
    where
        R: Fn(&RunState) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (L, T)>,
        L: Into<String>,
        T: Into<NodeId>,
    {
        let from = from.into();
        self.require_node(&from)?;
        let mut table = BTreeMap::new();
        for (label, target) in branches {
            let target = target.into();
            self.require_target(&target)?;
            table.insert(label.into(), target);
        }
        self.conditional_edges.push((
            from,
            ConditionalEdge {
                router: Arc::new(router),
                branches: table,
            },
        ));
        Ok(self)
    }

    /// Mark the node every run starts at
    pub fn set_entry_point(&mut self, name: impl Into<NodeId>) -> &mut Self {
        self.entry_points.push(name.into());
        self
    }

    /// Mark a node after whose execution the run finishes
    pub fn add_finish_point(&mut self, name: impl Into<NodeId>) -> &mut Self {
        let name = name.into();
        if !self.finish_points.contains(&name) {
            self.finish_points.push(name);
        }
        self
    }

    fn require_node(&self, name: &str) -> Result<()> {
        if self.nodes.contains_key(name) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(name.to_string()))
        }
    }

    fn require_target(&self, name: &str) -> Result<()> {
        if name == END {
            Ok(())
        } else {
            self.require_node(name)
        }
    }

    /// Validate the definition and freeze it into a [`Graph`]
    pub fn build(self) -> Result<Graph> {
        let entry = match self.entry_points.as_slice() {
            [] => return Err(GraphError::Validation("no entry point set".into())),
            [entry] => entry.clone(),
            many => {
                return Err(GraphError::Validation(format!(
                    "exactly one entry point is allowed, found {}: {}",
                    many.len(),
                    many.join(", ")
                )))
            }
        };
        if !self.nodes.contains_key(&entry) {
            return Err(GraphError::Validation(format!(
                "entry point '{}' is not a registered node",
                entry
            )));
        }
        for finish in &self.finish_points {
            if !self.nodes.contains_key(finish) {
                return Err(GraphError::Validation(format!(
                    "finish point '{}' is not a registered node",
                    finish
                )));
            }
        }

        let mut edges: HashMap<NodeId, Edges> = HashMap::new();
        for (from, to) in self.direct_edges {
            let slot = edges.entry(from.clone()).or_default();
            if let Some(existing) = &slot.direct {
                return Err(GraphError::Validation(format!(
                    "node '{}' has two unconditional edges (to '{}' and '{}')",
                    from, existing, to
                )));
            }
            slot.direct = Some(to);
        }
        for (from, conditional) in self.conditional_edges {
            if conditional.branches.is_empty() {
                return Err(GraphError::Validation(format!(
                    "conditional edge from '{}' has no branches",
                    from
                )));
            }
            let slot = edges.entry(from.clone()).or_default();
            if slot.conditional.is_some() {
                return Err(GraphError::Validation(format!(
                    "node '{}' has two conditional edges",
                    from
                )));
            }
            slot.conditional = Some(conditional);
        }
        for finish in &self.finish_points {
            if edges.get(finish).is_some_and(|e| !e.is_empty()) {
                return Err(GraphError::Validation(format!(
                    "finish point '{}' must not have outgoing edges",
                    finish
                )));
            }
        }

        Ok(Graph {
            nodes: self.nodes,
            order: self.order,
            edges,
            entry,
            finish_points: self.finish_points.into_iter().collect::<BTreeSet<_>>(),
            schema: self.schema,
        })
    }

    /// Validate and compile into an executable graph without persistence
    pub fn compile(self) -> Result<CompiledGraph> {
        Ok(CompiledGraph::new(self.build()?))
    }

    /// Compile and attach a checkpoint store
    pub fn compile_with_checkpointer(self, store: Arc<dyn CheckpointStore>) -> Result<CompiledGraph> {
        Ok(self.compile()?.with_checkpointer(store))
    }
}
