//! Configuration schema for the waypoint CLI

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use waypoint_llm::config::{DEFAULT_GROQ_MODEL, GROQ_API_KEY_ENV, GROQ_BASE_URL};

/// Main waypoint configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointConfig {
    /// Where run checkpoints are stored
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Language model used by the pipelines
    #[serde(default)]
    pub model: ModelConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Checkpoint store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Directory holding one JSON file per run
    pub dir: PathBuf,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".waypoint").join("runs"),
        }
    }
}

/// Model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Groq's OpenAI-compatible chat completions API
    Groq,
    /// Offline model that echoes its input
    Echo,
}

/// Language model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: Provider,

    /// Model name
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries for throttled or unavailable responses
    pub max_retries: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Groq,
            model: DEFAULT_GROQ_MODEL.to_string(),
            base_url: GROQ_BASE_URL.to_string(),
            api_key_env: GROQ_API_KEY_ENV.to_string(),
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
