//! Step events produced while a run advances

use crate::graph::NodeId;
use crate::state::PartialUpdate;
use futures::Stream;
use serde::Serialize;
use serde_json::Value;
use std::pin::Pin;

/// Observable record of one node execution
///
/// Events of a run are totally ordered and emitted in the order nodes execute.
/// An `Update` is emitted before the engine resolves the next node, so every
/// node's output is visible even when routing fails afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// A node returned a partial update, which has been merged
    Update {
        step: usize,
        node: NodeId,
        update: PartialUpdate,
    },

    /// A node suspended the run
    Interrupt {
        step: usize,
        node: NodeId,
        interrupt_id: String,
        payload: Value,
    },
}

impl StepEvent {
    /// Name of the node that produced the event
    pub fn node(&self) -> &str {
        match self {
            StepEvent::Update { node, .. } | StepEvent::Interrupt { node, .. } => node,
        }
    }

    pub fn step(&self) -> usize {
        match self {
            StepEvent::Update { step, .. } | StepEvent::Interrupt { step, .. } => *step,
        }
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, StepEvent::Interrupt { .. })
    }

    pub fn update(&self) -> Option<&PartialUpdate> {
        match self {
            StepEvent::Update { update, .. } => Some(update),
            StepEvent::Interrupt { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            StepEvent::Interrupt { payload, .. } => Some(payload),
            StepEvent::Update { .. } => None,
        }
    }
}

/// Lazy sequence of step events for one run
pub type StepStream<'a> = Pin<Box<dyn Stream<Item = crate::error::Result<StepEvent>> + Send + 'a>>;
