//! Human-in-the-loop interrupts
//!
//! A node pauses a run by returning [`NodeOutput::Interrupt`](crate::NodeOutput)
//! with a payload for the external controller (usually a UI showing something to
//! a reviewer). The engine then:
//!
//! ```text
//!  ┌──────────┐  Interrupt(payload)  ┌────────────────────────────────┐
//!  │  review  │ ───────────────────▶ │ run SUSPENDED, cursor = review │
//!  └──────────┘                      │ checkpoint saved               │
//!       ▲                            └───────────────┬────────────────┘
//!       │  re-run same node                          │ resume(run_id, value)
//!       │  with __decision__ = value                 ▼
//!       └──────────────────────────────── run RUNNING again
//! ```
//!
//! The same node runs again after resume, so it must look at
//! [`RunState::decision`](crate::RunState::decision) first and only interrupt
//! when no decision is present. [`Decision`] turns the raw resume value into
//! approve-or-feedback.

use crate::graph::NodeId;
use crate::state::RunState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The interrupt a suspended run is waiting on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInterrupt {
    /// Unique id of this suspension
    pub interrupt_id: String,

    /// Node that raised the interrupt; resume re-enters it
    pub node: NodeId,

    /// Opaque payload for the controller
    pub payload: Value,

    /// When the node interrupted
    pub raised_at: DateTime<Utc>,
}

impl PendingInterrupt {
    pub fn new(node: impl Into<NodeId>, payload: Value) -> Self {
        Self {
            interrupt_id: Uuid::new_v4().to_string(),
            node: node.into(),
            payload,
            raised_at: Utc::now(),
        }
    }
}

/// A reviewer's answer to an interrupt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed downstream
    Approve,
    /// Send the work back with this feedback
    Feedback(String),
}

impl Decision {
    /// Tokens accepted as approval, compared case-insensitively after trimming
    pub const APPROVE_TOKENS: &'static [&'static str] = &["approve", "approved"];

    /// Interpret a resume value
    ///
    /// Approval tokens and `true` approve; any other non-empty text is feedback.
    /// Objects of the form `{"feedback": "..."}` or `{"approved": bool}` are also
    /// understood. Anything else is not a decision.
    ///
    /// ```rust
    /// use waypoint_core::Decision;
    /// use serde_json::json;
    ///
    /// assert_eq!(Decision::from_value(&json!(" Approved ")), Some(Decision::Approve));
    /// assert_eq!(
    ///     Decision::from_value(&json!("needs tests")),
    ///     Some(Decision::Feedback("needs tests".into()))
    /// );
    /// assert_eq!(Decision::from_value(&json!("")), None);
    /// ```
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(true) => Some(Decision::Approve),
            Value::String(text) => Self::parse(text),
            Value::Object(map) => {
                if let Some(text) = map.get("feedback").and_then(Value::as_str) {
                    return Self::parse(text);
                }
                match map.get("approved") {
                    Some(Value::Bool(true)) => Some(Decision::Approve),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Interpret free text typed by a reviewer
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lowered = trimmed.to_lowercase();
        if Self::APPROVE_TOKENS.contains(&lowered.as_str()) {
            Some(Decision::Approve)
        } else {
            Some(Decision::Feedback(trimmed.to_string()))
        }
    }

    /// The decision injected into `state` by the last resume, if any
    pub fn from_state(state: &RunState) -> Option<Self> {
        state.decision().and_then(Self::from_value)
    }

    pub fn is_approval(&self) -> bool {
        matches!(self, Decision::Approve)
    }

    /// Feedback text, if this is not an approval
    pub fn feedback(&self) -> Option<&str> {
        match self {
            Decision::Approve => None,
            Decision::Feedback(text) => Some(text),
        }
    }
}

impl From<Decision> for Value {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approve => Value::String("approve".into()),
            Decision::Feedback(text) => Value::String(text),
        }
    }
}
