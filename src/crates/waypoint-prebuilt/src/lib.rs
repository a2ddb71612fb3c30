//! # waypoint-prebuilt - Ready-Made Graphs
//!
//! Graphs and building blocks assembled from `waypoint-core` primitives:
//!
//! - **[Chatbots](chat)** - a single-node chatbot and a tool-calling chatbot
//!   over an append-only `messages` log
//! - **[Tools](tools)** - the [`Tool`] trait, a [`ToolRegistry`] and the
//!   [`ToolNode`] that executes a model's tool calls
//! - **[Review cycles](review)** - produce → human review → approve or revise,
//!   with optional revision caps
//! - **[SDLC pipeline](sdlc)** - user stories, design, code, security review
//!   and test cases, each behind an approval gate
//!
//! Nothing here needs engine support beyond nodes, edges, reducers and
//! interrupts; every graph is returned as an uncompiled [`StateGraph`] so
//! callers can attach a checkpoint store or extend it first.
//!
//! ```rust
//! use std::sync::Arc;
//! use waypoint_core::ScriptedModel;
//! use waypoint_prebuilt::{build_sdlc_graph, SdlcConfig};
//!
//! let model = Arc::new(ScriptedModel::default());
//! let graph = build_sdlc_graph(model, SdlcConfig::default()).unwrap();
//! let mermaid = graph.compile().unwrap().to_mermaid();
//! assert!(mermaid.contains("security_review"));
//! ```
//!
//! [`StateGraph`]: waypoint_core::StateGraph

pub mod chat;
pub mod error;
pub mod review;
pub mod sdlc;
pub mod tool_node;
pub mod tools;

pub use chat::{build_basic_chatbot, build_tool_chatbot, chat_schema, read_messages, MESSAGES};
pub use error::{PrebuiltError, Result};
pub use review::{produce_with_feedback, review_log, ReviewCycle, ReviewRecord, REVIEW_LOG};
pub use sdlc::{build_sdlc_graph, initial_state, sdlc_schema, SdlcConfig};
pub use tool_node::{tools_condition, ToolNode};
pub use tools::{ClockTool, Tool, ToolInput, ToolOutput, ToolRegistry};
