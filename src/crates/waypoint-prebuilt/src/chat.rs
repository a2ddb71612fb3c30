//! Chatbot graphs
//!
//! Both graphs keep the conversation in one append-only `messages` field; every
//! node returns only the messages it adds.
//!
//! ```text
//! basic:                      with tools:
//!
//! START → chatbot → END       START → chatbot ──"end"──▶ END
//!                                       ▲    │
//!                                       │  "tools"
//!                                       │    ▼
//!                                       └─ tools
//! ```
//!
//! ```rust
//! use std::sync::Arc;
//! use waypoint_core::{ChatMessage, RunState, ScriptedModel};
//! use waypoint_prebuilt::chat::{build_basic_chatbot, MESSAGES};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> waypoint_core::Result<()> {
//! let model = Arc::new(ScriptedModel::from_texts(["Hi there"]));
//! let app = build_basic_chatbot(model)?.compile()?;
//!
//! let input = RunState::new().with(MESSAGES, vec![ChatMessage::user("Hello").to_value()]);
//! let state = app.invoke("chat-1", input).await?;
//! assert_eq!(state.get_array(MESSAGES).map(|m| m.len()), Some(2));
//! # Ok(())
//! # }
//! ```

use crate::error::{PrebuiltError, Result};
use crate::tool_node::{tools_condition, ToolNode, END_LABEL, TOOLS_LABEL};
use crate::tools::ToolRegistry;
use std::sync::Arc;
use tracing::debug;
use waypoint_core::{
    ChatMessage, LanguageModel, ModelError, NodeOutput, PartialUpdate, RunState, StateGraph,
    StateSchema, END,
};

/// State field holding the conversation log
pub const MESSAGES: &str = "messages";

/// Name of the model node in both chat graphs
pub const CHATBOT_NODE: &str = "chatbot";

/// Name of the tool-executing node
pub const TOOLS_NODE: &str = "tools";

/// Schema with a single append-only `messages` sequence
pub fn chat_schema() -> waypoint_core::Result<StateSchema> {
    Ok(StateSchema::new().sequence(MESSAGES)?)
}

/// Decode the conversation stored in `messages`; an unset field is an empty log
pub fn read_messages(state: &RunState) -> Result<Vec<ChatMessage>> {
    match state.get_array(MESSAGES) {
        None => Ok(Vec::new()),
        Some(values) => ChatMessage::from_values(values)
            .map_err(|e| PrebuiltError::MessageParsing(e.to_string())),
    }
}

/// Single-node chatbot: every turn appends one assistant reply
pub fn build_basic_chatbot(model: Arc<dyn LanguageModel>) -> waypoint_core::Result<StateGraph> {
    let mut graph = StateGraph::new(chat_schema()?);
    graph.add_node(CHATBOT_NODE, move |state: RunState| {
        let model = model.clone();
        async move {
            let messages = read_messages(&state)?;
            debug!(model = model.name(), history = messages.len(), "Chatbot turn");
            let reply = model.chat(&messages, &[]).await?.into_content()?;
            let update = PartialUpdate::new().set(MESSAGES, ChatMessage::assistant(reply).to_value());
            Ok(NodeOutput::from(update))
        }
    })?;
    graph.set_entry_point(CHATBOT_NODE);
    graph.add_finish_point(CHATBOT_NODE);
    Ok(graph)
}

/// Chatbot that may call the tools in `registry` before answering
///
/// The model sees the registry's tool definitions on every turn. A turn with
/// neither text nor tool calls fails the node with
/// [`ModelError::MissingContent`].
pub fn build_tool_chatbot(
    model: Arc<dyn LanguageModel>,
    registry: ToolRegistry,
) -> waypoint_core::Result<StateGraph> {
    let definitions = Arc::new(registry.definitions());
    let tool_node = ToolNode::new(Arc::new(registry));

    let mut graph = StateGraph::new(chat_schema()?);
    graph.add_node(CHATBOT_NODE, move |state: RunState| {
        let model = model.clone();
        let definitions = definitions.clone();
        async move {
            let messages = read_messages(&state)?;
            let response = model.chat(&messages, &definitions).await?;
            if response.content.is_none() && response.tool_calls.is_empty() {
                return Err(ModelError::MissingContent.into());
            }
            debug!(tool_calls = response.tool_calls.len(), "Chatbot turn");
            let update = PartialUpdate::new().set(MESSAGES, response.into_message().to_value());
            Ok(NodeOutput::from(update))
        }
    })?;
    graph.add_node(TOOLS_NODE, move |state: RunState| {
        let tool_node = tool_node.clone();
        async move { Ok(NodeOutput::from(tool_node.execute(&state).await?)) }
    })?;
    graph.add_conditional_edge(
        CHATBOT_NODE,
        tools_condition,
        [(TOOLS_LABEL, TOOLS_NODE), (END_LABEL, END)],
    )?;
    graph.add_edge(TOOLS_NODE, CHATBOT_NODE)?;
    graph.set_entry_point(CHATBOT_NODE);
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ClockTool;
    use serde_json::json;
    use waypoint_core::{GraphError, MessageRole, ModelResponse, ScriptedModel, ToolCall};

    fn user(text: &str) -> RunState {
        RunState::new().with(MESSAGES, vec![ChatMessage::user(text).to_value()])
    }

    #[tokio::test]
    async fn test_basic_chatbot_appends_reply() {
        let model = Arc::new(ScriptedModel::from_texts(["Hello!"]));
        let app = build_basic_chatbot(model.clone()).unwrap().compile().unwrap();

        let state = app.invoke("t1", user("hi")).await.unwrap();
        let messages = read_messages(&state).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], ChatMessage::assistant("Hello!"));
        assert_eq!(model.prompts(), vec!["user: hi".to_string()]);
    }

    #[tokio::test]
    async fn test_tool_chatbot_runs_tools_then_answers() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "clock".into(),
            args: json!({}),
        };
        let model = Arc::new(ScriptedModel::new([
            ModelResponse::with_tool_calls(vec![call]),
            ModelResponse::text("It is now."),
        ]));
        let registry = ToolRegistry::new().with_tool(ClockTool);
        let app = build_tool_chatbot(model.clone(), registry)
            .unwrap()
            .compile()
            .unwrap();

        let state = app.invoke("t2", user("what time is it?")).await.unwrap();
        let messages = read_messages(&state).unwrap();
        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Tool,
                MessageRole::Assistant
            ]
        );
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("call_1"));
        assert!(messages[2].content.contains("unix"));
        assert_eq!(messages[3].content, "It is now.");
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_response_fails_the_chatbot_node() {
        let model = Arc::new(ScriptedModel::new([ModelResponse::default()]));
        let app = build_tool_chatbot(model, ToolRegistry::new())
            .unwrap()
            .compile()
            .unwrap();

        let err = app.invoke("t3", user("hi")).await.unwrap_err();
        match err {
            GraphError::NodeExecution { node, error } => {
                assert_eq!(node, CHATBOT_NODE);
                assert!(error.contains("does not contain content"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_messages_rejects_garbage() {
        let state = RunState::new().with(MESSAGES, vec![json!({"role": "robot"})]);
        assert!(matches!(
            read_messages(&state),
            Err(PrebuiltError::MessageParsing(_))
        ));
        assert!(read_messages(&RunState::new()).unwrap().is_empty());
    }
}
