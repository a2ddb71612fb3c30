//! Provider configuration.

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Groq's OpenAI-compatible endpoint.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Model used when none is configured.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Environment variable holding the Groq API key.
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Configuration for remote chat-completions providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API, without the `/chat/completions` suffix.
    pub base_url: String,

    /// Model name/identifier.
    pub model: String,

    /// Request timeout duration.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Maximum retries for throttled or failed requests.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubled on every further attempt.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: Duration,

    /// Sampling temperature, provider default when unset.
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl RemoteLlmConfig {
    /// Create a new remote configuration.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
            temperature: None,
        }
    }

    /// Create configuration with the API key read from `env_var`.
    pub fn from_env(
        env_var: &str,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = std::env::var(env_var)
            .map_err(|_| LlmError::ApiKeyNotFound(format!("Environment variable: {}", env_var)))?;
        if api_key.trim().is_empty() {
            return Err(LlmError::ApiKeyNotFound(format!(
                "Environment variable {} is empty",
                env_var
            )));
        }

        Ok(Self::new(api_key, base_url, model))
    }

    /// Groq defaults with the key taken from `GROQ_API_KEY`.
    pub fn groq_from_env() -> Result<Self> {
        Self::from_env(GROQ_API_KEY_ENV, GROQ_BASE_URL, DEFAULT_GROQ_MODEL)
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> Duration {
    Duration::from_millis(500)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_config_builder() {
        let config = RemoteLlmConfig::new("test-key", GROQ_BASE_URL, "llama-3.1-8b-instant")
            .with_timeout(Duration::from_secs(120))
            .with_max_retries(5)
            .with_temperature(0.2);

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_completions_url_ignores_trailing_slash() {
        let config = RemoteLlmConfig::new("k", "http://localhost:8080/v1/", "m");
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_backoff_doubles() {
        let config =
            RemoteLlmConfig::new("k", GROQ_BASE_URL, "m").with_retry_backoff(Duration::from_millis(100));
        assert_eq!(config.backoff_for(0), Duration::from_millis(100));
        assert_eq!(config.backoff_for(1), Duration::from_millis(200));
        assert_eq!(config.backoff_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_missing_env_var() {
        let err = RemoteLlmConfig::from_env("WAYPOINT_TEST_UNSET_KEY", GROQ_BASE_URL, "m")
            .unwrap_err();
        assert!(err.is_auth_error());
    }
}
