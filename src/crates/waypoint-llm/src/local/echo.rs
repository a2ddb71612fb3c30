//! Deterministic offline model.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use waypoint_core::{
    ChatMessage, LanguageModel, MessageRole, ModelError, ModelResponse, ToolCall, ToolDefinition,
};

const DEFAULT_MAX_CHARS: usize = 240;

/// Answers by echoing its input
///
/// `invoke` returns the first line of the prompt, trimmed to `max_chars`.
/// In chat mode the model calls a tool when the last user message names one of
/// the offered tools, reports tool results back, and otherwise echoes the last
/// user message.
#[derive(Debug, Clone)]
pub struct EchoModel {
    prefix: String,
    max_chars: usize,
}

impl Default for EchoModel {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoModel {
    pub fn new() -> Self {
        Self {
            prefix: "echo: ".to_string(),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    fn echo(&self, text: &str) -> String {
        let head = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
        let clipped: String = head.trim().chars().take(self.max_chars).collect();
        format!("{}{}", self.prefix, clipped)
    }
}

#[async_trait]
impl LanguageModel for EchoModel {
    async fn invoke(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
        Ok(ModelResponse::text(self.echo(prompt)))
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, ModelError> {
        let Some(last) = messages.last() else {
            return Ok(ModelResponse::text(self.echo("")));
        };

        match last.role {
            MessageRole::Tool => Ok(ModelResponse::text(format!(
                "{}tool result: {}",
                self.prefix, last.content
            ))),
            _ => {
                let wanted = last.content.to_lowercase();
                if let Some(tool) = tools
                    .iter()
                    .find(|tool| wanted.contains(&tool.name.to_lowercase()))
                {
                    debug!(tool = %tool.name, "Echo model requesting tool call");
                    return Ok(ModelResponse::with_tool_calls(vec![ToolCall {
                        id: format!("call_{}", messages.len()),
                        name: tool.name.clone(),
                        args: json!({}),
                    }]));
                }
                Ok(ModelResponse::text(self.echo(&last.content)))
            }
        }
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> ToolDefinition {
        ToolDefinition {
            name: "clock".into(),
            description: "Current UTC time".into(),
            parameters: json!({"type": "object"}),
        }
    }

    #[tokio::test]
    async fn test_invoke_echoes_first_line() {
        let model = EchoModel::new().with_max_chars(5);
        let response = model.invoke("\n  Requirements: a todo app\nmore").await.unwrap();
        assert_eq!(response.into_content().unwrap(), "echo: Requi");
    }

    #[tokio::test]
    async fn test_chat_echoes_last_user_message() {
        let model = EchoModel::new().with_prefix("> ");
        let response = model
            .chat(
                &[ChatMessage::system("be brief"), ChatMessage::user("hello there")],
                &[],
            )
            .await
            .unwrap();
        assert_eq!(response.content.as_deref(), Some("> hello there"));
    }

    #[tokio::test]
    async fn test_chat_calls_named_tool_then_reports_result() {
        let model = EchoModel::new();
        let mut log = vec![ChatMessage::user("What does the Clock say?")];

        let first = model.chat(&log, &[clock()]).await.unwrap();
        assert!(first.content.is_none());
        assert_eq!(first.tool_calls[0].name, "clock");
        assert_eq!(first.tool_calls[0].id, "call_1");

        log.push(first.into_message());
        log.push(ChatMessage::tool("call_1", "2026-01-01T00:00:00Z"));
        let second = model.chat(&log, &[clock()]).await.unwrap();
        assert_eq!(
            second.into_content().unwrap(),
            "echo: tool result: 2026-01-01T00:00:00Z"
        );
    }
}
