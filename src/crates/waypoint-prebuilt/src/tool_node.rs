//! ToolNode - executes the tool calls of the latest assistant message
//!
//! ```text
//! messages: [.., assistant{tool_calls: [a, b]}]
//!                    │
//!                    ▼ ToolNode::execute
//! update:   {messages: [tool{id: a, ..}, tool{id: b, ..}]}
//! ```
//!
//! Calls run one at a time in the order the model listed them, and each one
//! produces exactly one tool message. An unknown tool or a failing tool becomes
//! an `Error: ..` tool message so the model can react to it; the run itself
//! does not fail.

use crate::chat::{read_messages, MESSAGES};
use crate::error::Result;
use crate::tools::{Tool, ToolRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use waypoint_core::{ChatMessage, MessageRole, PartialUpdate, RunState, ToolCall};

/// Label returned by [`tools_condition`] when tools must run
pub const TOOLS_LABEL: &str = "tools";

/// Label returned by [`tools_condition`] when the conversation turn is over
pub const END_LABEL: &str = "end";

/// ToolNode executes tools based on tool calls in messages
#[derive(Clone)]
pub struct ToolNode {
    /// Tool registry containing available tools
    registry: Arc<ToolRegistry>,
}

impl ToolNode {
    /// Create a new ToolNode with the given tool registry
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Create a new ToolNode from a list of tools
    pub fn from_tools(tools: Vec<Box<dyn Tool>>) -> Self {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        Self::new(Arc::new(registry))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run the pending tool calls and return the tool messages to append
    pub async fn execute(&self, state: &RunState) -> Result<PartialUpdate> {
        let messages = read_messages(state)?;
        let tool_calls = find_tool_calls(&messages);

        let mut results = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            debug!(tool = %call.name, call_id = %call.id, "Executing tool call");
            let result = self.registry.execute(&call.name, call.args.clone()).await;
            if let Err(e) = &result {
                warn!(tool = %call.name, error = %e, "Tool call failed");
            }
            results.push(create_tool_message(call, result).to_value());
        }

        Ok(PartialUpdate::new().set(MESSAGES, Value::Array(results)))
    }
}

/// Tool calls of the last assistant message
fn find_tool_calls(messages: &[ChatMessage]) -> Vec<ToolCall> {
    messages
        .iter()
        .rev()
        .find(|msg| msg.role == MessageRole::Assistant)
        .map(|msg| msg.tool_calls.clone())
        .unwrap_or_default()
}

/// Create a tool message from a tool call result
fn create_tool_message(call: ToolCall, result: Result<Value>) -> ChatMessage {
    let content = match result {
        Ok(Value::String(text)) => text,
        Ok(value) => value.to_string(),
        Err(e) => format!("Error: {}", e),
    };
    ChatMessage::tool(call.id, content)
}

/// Route to the tool node when the last message asks for tool calls
///
/// Returns [`TOOLS_LABEL`] or [`END_LABEL`]. A message that cannot be decoded
/// counts as a finished turn.
pub fn tools_condition(state: &RunState) -> String {
    let wants_tools = state
        .get_array(MESSAGES)
        .and_then(|messages| messages.last())
        .and_then(|last| serde_json::from_value::<ChatMessage>(last.clone()).ok())
        .is_some_and(|msg| msg.has_tool_calls());

    if wants_tools {
        TOOLS_LABEL.to_string()
    } else {
        END_LABEL.to_string()
    }
}
