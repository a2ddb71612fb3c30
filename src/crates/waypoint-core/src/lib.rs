//! # waypoint-core - Workflow graphs with human-in-the-loop interrupts
//!
//! A directed, possibly cyclic graph of named async nodes, executed one node at
//! a time against a shared state whose fields are merged by per-field reducers.
//! Any node may **suspend** a run to wait for an external decision; the run is
//! checkpointed and can be resumed later, in the same process or another one.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateGraph (builder)                                        │
//! │    add_node / add_edge / add_conditional_edge                │
//! │    set_entry_point / add_finish_point                        │
//! └──────────────┬───────────────────────────────────────────────┘
//!                │ compile()  → Validation / UnknownNode errors
//!                ↓
//! ┌──────────────────────────────────────────────────────────────┐
//! │  CompiledGraph                                                │
//! │    start(run_id, state) → Run                                 │
//! │    step(&mut Run) / stream(&mut Run) → StepEvent              │
//! │    resume(run_id, decision)                                   │
//! └──────────────┬───────────────────────────────────────────────┘
//!                │ save after every step
//!                ↓
//! ┌──────────────────────────────────────────────────────────────┐
//! │  CheckpointStore (waypoint-checkpoint)                        │
//! │    in-memory, file-backed, or your own backend                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start: an approval loop
//!
//! ```rust
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use serde_json::json;
//! use waypoint_core::{
//!     CompiledGraph, Decision, InMemoryCheckpointStore, NodeOutput, PartialUpdate, RunState,
//!     StateGraph, StateSchema, END,
//! };
//!
//! # async fn demo() -> waypoint_core::Result<()> {
//! let schema = StateSchema::new().text("draft")?.text("feedback")?;
//! let mut graph = StateGraph::new(schema);
//! graph
//!     .add_node("produce", |state: RunState| async move {
//!         let draft = match state.get_str("feedback") {
//!             Some(_) => "v2",
//!             None => "v1",
//!         };
//!         Ok(PartialUpdate::new().set("draft", draft).into())
//!     })?
//!     .add_node("review", |state: RunState| async move {
//!         Ok(match Decision::from_state(&state) {
//!             None => NodeOutput::interrupt(json!({"review": state.get_str("draft")})),
//!             Some(Decision::Approve) => NodeOutput::empty(),
//!             Some(Decision::Feedback(text)) => PartialUpdate::new().set("feedback", text).into(),
//!         })
//!     })?
//!     .add_edge("produce", "review")?
//!     .add_conditional_edge(
//!         "review",
//!         |state: &RunState| match Decision::from_state(state) {
//!             Some(Decision::Approve) => "approve".to_string(),
//!             _ => "reject".to_string(),
//!         },
//!         [("approve", END), ("reject", "produce")],
//!     )?
//!     .set_entry_point("produce");
//!
//! let store = Arc::new(InMemoryCheckpointStore::new());
//! let app: CompiledGraph = graph.compile_with_checkpointer(store)?;
//!
//! let mut run = app.start("run-1", RunState::new())?;
//! {
//!     let mut events = app.stream(&mut run);
//!     while let Some(event) = events.next().await {
//!         println!("{:?}", event?);
//!     }
//! }
//! // suspended at "review"; later, possibly in another process:
//! let mut run = app.resume("run-1", "approve").await?;
//! {
//!     let mut events = app.stream(&mut run);
//!     while let Some(event) = events.next().await {
//!         event?;
//!     }
//! }
//! assert_eq!(run.state().get_str("draft"), Some("v1"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`state`] - schema, reducers, [`RunState`], [`PartialUpdate`]
//! - [`graph`] / [`builder`] - graph model and [`StateGraph`]
//! - [`compiled`] - [`CompiledGraph`] and [`Run`]: the execution engine
//! - [`interrupt`] - [`PendingInterrupt`] and [`Decision`]
//! - [`memo`] - memo-on-reentry helper for nodes
//! - [`llm`] / [`messages`] - the language-model collaborator interface
//! - [`visualization`] - Mermaid rendering

pub mod builder;
pub mod compiled;
pub mod error;
pub mod graph;
pub mod interrupt;
pub mod llm;
pub mod memo;
pub mod messages;
pub mod node_result;
pub mod state;
pub mod stream;
pub mod visualization;

pub use builder::StateGraph;
pub use compiled::{CompiledGraph, Run};
pub use error::{GraphError, Result};
pub use graph::{Graph, NodeId, END};
pub use interrupt::{Decision, PendingInterrupt};
pub use llm::{LanguageModel, ModelError, ModelResponse, ScriptedModel};
pub use messages::{ChatMessage, MessageRole, ToolCall, ToolDefinition};
pub use node_result::NodeOutput;
pub use state::{FieldKind, PartialUpdate, Reducer, RunState, StateSchema, DECISION_FIELD};
pub use stream::{StepEvent, StepStream};

pub use waypoint_checkpoint::{
    Checkpoint, CheckpointError, CheckpointMetadata, CheckpointSource, CheckpointStore,
    FileCheckpointStore, InMemoryCheckpointStore, RunStatus,
};
