//! Node output types
//!
//! A node either hands back a [`PartialUpdate`] to merge into the run state, or
//! asks the engine to suspend the run with an [`Interrupt`](NodeOutput::Interrupt)
//! payload for an external controller.

use crate::state::PartialUpdate;
use serde_json::Value;

/// What a node returns from a successful execution
///
/// ```rust
/// use waypoint_core::{NodeOutput, PartialUpdate};
/// use serde_json::json;
///
/// let update: NodeOutput = PartialUpdate::new().set("draft", "v1").into();
/// assert!(!update.is_interrupt());
///
/// let pause = NodeOutput::interrupt(json!({"review": "v1"}));
/// assert!(pause.is_interrupt());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    /// Fields to merge into the run state
    Update(PartialUpdate),

    /// Suspend the run and surface this payload to the caller
    Interrupt(Value),
}

impl NodeOutput {
    /// Suspend the run with `payload`
    pub fn interrupt(payload: impl Into<Value>) -> Self {
        NodeOutput::Interrupt(payload.into())
    }

    /// An update that touches no fields
    pub fn empty() -> Self {
        NodeOutput::Update(PartialUpdate::new())
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, NodeOutput::Interrupt(_))
    }
}

impl From<PartialUpdate> for NodeOutput {
    fn from(update: PartialUpdate) -> Self {
        NodeOutput::Update(update)
    }
}
