//! Language model providers for waypoint graphs.
//!
//! This crate provides implementations of the `LanguageModel` trait from
//! `waypoint-core`.
//!
//! # Remote Providers
//!
//! - **Groq** - OpenAI-compatible chat completions with tool calling, retries
//!   and exponential backoff
//!
//! # Local Providers
//!
//! - **Echo** - deterministic offline model for demos and dry runs
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use waypoint_llm::remote::GroqClient;
//! use waypoint_llm::config::RemoteLlmConfig;
//! use waypoint_core::LanguageModel;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteLlmConfig::groq_from_env()?.with_temperature(0.2);
//!     let client = GroqClient::new(config)?;
//!
//!     let response = client.invoke("Explain reducers in one sentence").await?;
//!     println!("Response: {}", response.into_content()?);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;

#[cfg(feature = "local")]
pub mod local;

#[cfg(feature = "remote")]
pub mod remote;

// Re-export commonly used types
pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};

#[cfg(feature = "local")]
pub use local::EchoModel;

#[cfg(feature = "remote")]
pub use remote::GroqClient;

// Re-export core model types for convenience
pub use waypoint_core::{ChatMessage, LanguageModel, ModelError, ModelResponse, ToolCall, ToolDefinition};
