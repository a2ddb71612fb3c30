//! Groq client implementation.
//!
//! Groq serves open-weight models behind an OpenAI-compatible chat-completions
//! API, so this client also works against any other server speaking that
//! format (set `base_url` accordingly).
//!
//! # Example
//!
//! ```rust,ignore
//! use waypoint_llm::remote::GroqClient;
//! use waypoint_llm::config::RemoteLlmConfig;
//! use waypoint_core::LanguageModel;
//!
//! let config = RemoteLlmConfig::groq_from_env()?;
//! let client = GroqClient::new(config)?;
//!
//! let response = client.invoke("Write three user stories for a todo app").await?;
//! println!("{}", response.into_content()?);
//! ```

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use waypoint_core::{
    ChatMessage, LanguageModel, MessageRole, ModelError, ModelResponse, ToolCall, ToolDefinition,
};

/// Groq API client.
#[derive(Clone)]
pub struct GroqClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl GroqClient {
    /// Create a new Groq client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RemoteLlmConfig {
        &self.config
    }

    /// Convert a chat message to the wire format.
    fn convert_message(&self, msg: &ChatMessage) -> GroqMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|call| GroqToolCall {
                        id: call.id.clone(),
                        kind: "function".to_string(),
                        function: GroqFunctionCall {
                            name: call.name.clone(),
                            arguments: call.args.to_string(),
                        },
                    })
                    .collect(),
            )
        };

        GroqMessage {
            role: msg.role.as_str().to_string(),
            content: match (&msg.role, msg.content.is_empty(), &tool_calls) {
                // assistant turns that only call tools carry no content
                (MessageRole::Assistant, true, Some(_)) => None,
                _ => Some(msg.content.clone()),
            },
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    fn convert_tool(&self, tool: &ToolDefinition) -> GroqTool {
        GroqTool {
            kind: "function".to_string(),
            function: GroqFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }

    /// Convert the provider response to a model response.
    fn convert_response(&self, resp: GroqResponse) -> Result<ModelResponse> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                // the model occasionally emits malformed JSON; keep it as text
                args: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments)),
            })
            .collect();

        debug!(
            model = %resp.model,
            finish_reason = choice.finish_reason.as_deref().unwrap_or_default(),
            "Received completion"
        );

        Ok(ModelResponse {
            content: choice.message.content,
            tool_calls,
        })
    }

    fn build_request(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> GroqRequest {
        GroqRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(|m| self.convert_message(m)).collect(),
            temperature: self.config.temperature,
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.iter().map(|t| self.convert_tool(t)).collect())
            },
            tool_choice: if tools.is_empty() { None } else { Some("auto".to_string()) },
            stream: false,
        }
    }

    /// One HTTP round trip, classified into retryable and fatal errors.
    async fn send_once(&self, body: &GroqRequest) -> Result<GroqResponse> {
        let response = self
            .client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, error_text));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    /// Send a chat-completions request, retrying throttled and 5xx answers.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse> {
        let body = self.build_request(messages, tools);
        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(resp) => return self.convert_response(resp),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.backoff_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying model request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn classify_status(status: StatusCode, error_text: String) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationError(error_text),
        429 => LlmError::RateLimitExceeded(error_text),
        500..=599 => LlmError::ServiceUnavailable(format!("Groq API error {}: {}", status, error_text)),
        _ => LlmError::ProviderError(format!("Groq API error {}: {}", status, error_text)),
    }
}

#[async_trait]
impl LanguageModel for GroqClient {
    async fn invoke(&self, prompt: &str) -> std::result::Result<ModelResponse, ModelError> {
        Ok(self.complete(&[ChatMessage::user(prompt)], &[]).await?)
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> std::result::Result<ModelResponse, ModelError> {
        Ok(self.complete(messages, tools).await?)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

// Groq API types (OpenAI-compatible)
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GroqTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<GroqToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: GroqFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqFunctionCall {
    name: String,
    /// JSON-encoded arguments
    arguments: String,
}

#[derive(Debug, Serialize)]
struct GroqTool {
    #[serde(rename = "type")]
    kind: String,
    function: GroqFunction,
}

#[derive(Debug, Serialize)]
struct GroqFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    #[serde(default)]
    model: String,
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqMessage,
    finish_reason: Option<String>,
}

fn function_kind() -> String {
    "function".to_string()
}
