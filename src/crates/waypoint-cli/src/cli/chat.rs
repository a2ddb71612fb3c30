//! Multi-turn chat carried across invocations by the run's checkpoint

use super::CliContext;
use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::debug;
use waypoint_core::{ChatMessage, CheckpointStore, MessageRole, RunState};
use waypoint_prebuilt::{build_basic_chatbot, build_tool_chatbot, ClockTool, ToolRegistry, MESSAGES};

/// Conversation stored for `run_id`, or an empty one for a new run
async fn history(ctx: &CliContext, run_id: &str) -> Result<Vec<Value>> {
    let checkpoint = match ctx.store.load(run_id).await {
        Ok(checkpoint) => checkpoint,
        Err(e) if e.is_not_found() => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to load run '{}'", run_id)),
    };
    match checkpoint.state.get(MESSAGES) {
        Some(Value::Array(messages)) => Ok(messages.clone()),
        _ => bail!("Run '{}' is not a chat run", run_id),
    }
}

/// Text of the last assistant message
pub fn last_reply(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::Assistant && !m.content.is_empty())
        .map(|m| m.content.as_str())
}

/// Send one user message and print the reply
pub async fn handle_chat(ctx: &CliContext, run_id: String, message: String, tools: bool) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Message must not be empty");
    }
    let model = ctx.model()?;
    let graph = if tools {
        build_tool_chatbot(model, ToolRegistry::new().with_tool(ClockTool))?
    } else {
        build_basic_chatbot(model)?
    };
    let app = graph.compile_with_checkpointer(ctx.store.clone())?;

    let mut messages = history(ctx, &run_id).await?;
    debug!(run_id = %run_id, history = messages.len(), "Continuing chat");
    messages.push(ChatMessage::user(message).to_value());

    let state = app
        .invoke(run_id.as_str(), RunState::new().with(MESSAGES, messages))
        .await
        .with_context(|| format!("Chat turn for run '{}' failed", run_id))?;

    let transcript = waypoint_prebuilt::read_messages(&state)?;
    for call in transcript
        .iter()
        .rev()
        .take_while(|m| m.role != MessageRole::User)
        .filter(|m| m.role == MessageRole::Tool)
    {
        debug!(tool_call_id = ?call.tool_call_id, result = %call.content, "Tool result");
    }
    match last_reply(&transcript) {
        Some(reply) => println!("{}", reply),
        None => println!("(no reply)"),
    }
    Ok(())
}
