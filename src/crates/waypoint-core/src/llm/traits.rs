//! Language model trait and response types

use crate::messages::{render_transcript, ChatMessage, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a model call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The provider answered without any text content
    #[error("Model response does not contain content")]
    MissingContent,

    /// Generic provider-side failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// Credentials were rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The provider throttled the request
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The response could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider could not be reached
    #[error("Model unavailable: {0}")]
    Unavailable(String),
}

/// What a model returned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Generated text; providers may omit it (e.g. pure tool-call turns)
    pub content: Option<String>,

    /// Tool calls requested by the model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A response asking for tool calls
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }

    /// The generated text, or [`ModelError::MissingContent`]
    pub fn into_content(self) -> Result<String, ModelError> {
        self.content.ok_or(ModelError::MissingContent)
    }

    /// Turn the response into an assistant message for a chat log
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::assistant(self.content.unwrap_or_default()).with_tool_calls(self.tool_calls)
    }
}

/// A text-generation collaborator
///
/// ```rust
/// use async_trait::async_trait;
/// use waypoint_core::llm::{LanguageModel, ModelError, ModelResponse};
///
/// struct Shouty;
///
/// #[async_trait]
/// impl LanguageModel for Shouty {
///     async fn invoke(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
///         Ok(ModelResponse::text(prompt.to_uppercase()))
///     }
/// }
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a single prompt
    async fn invoke(&self, prompt: &str) -> Result<ModelResponse, ModelError>;

    /// Continue a conversation, optionally offering tools
    ///
    /// The default flattens the conversation into one prompt and ignores
    /// `tools`; providers with native chat support should override it.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, ModelError> {
        let _ = tools;
        self.invoke(&render_transcript(messages)).await
    }

    /// Short provider/model name for logs
    fn name(&self) -> &str {
        "model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl LanguageModel for Echo {
        async fn invoke(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse::text(prompt))
        }
    }

    #[tokio::test]
    async fn test_default_chat_flattens_transcript() {
        let response = Echo
            .chat(&[ChatMessage::user("a"), ChatMessage::assistant("b")], &[])
            .await
            .unwrap();
        assert_eq!(response.into_content().unwrap(), "user: a\n\nassistant: b");
    }

    #[test]
    fn test_missing_content_is_an_error() {
        let response = ModelResponse::default();
        assert_eq!(response.into_content(), Err(ModelError::MissingContent));
    }

    #[test]
    fn test_into_message_keeps_tool_calls() {
        let call = ToolCall {
            id: "1".into(),
            name: "clock".into(),
            args: serde_json::json!({}),
        };
        let message = ModelResponse::with_tool_calls(vec![call.clone()]).into_message();
        assert_eq!(message.content, "");
        assert_eq!(message.tool_calls, vec![call]);
    }

    #[tokio::test]
    async fn test_trait_object() {
        let model: Box<dyn LanguageModel> = Box::new(Echo);
        assert_eq!(model.name(), "model");
        assert!(model.invoke("x").await.is_ok());
    }
}
