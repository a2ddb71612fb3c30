//! Error types for language model providers.

use thiserror::Error;
use waypoint_core::ModelError;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when talking to a provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to serialize/deserialize data.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// API authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// API key not found in environment.
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// Provider answered with a 5xx status.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid response from provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// General provider error.
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::HttpError(e) => e.is_timeout() || e.is_connect(),
            LlmError::ServiceUnavailable(_) | LlmError::RateLimitExceeded(_) => true,
            _ => false,
        }
    }

    /// Check if this error is due to authentication.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            LlmError::AuthenticationError(_) | LlmError::ApiKeyNotFound(_)
        )
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

/// Convert LlmError to the model error graph nodes see.
impl From<LlmError> for ModelError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::AuthenticationError(msg) | LlmError::ApiKeyNotFound(msg) => {
                ModelError::Authentication(msg)
            }
            LlmError::RateLimitExceeded(msg) => ModelError::RateLimited(msg),
            LlmError::ServiceUnavailable(msg) => ModelError::Unavailable(msg),
            LlmError::HttpError(e) => ModelError::Unavailable(e.to_string()),
            LlmError::InvalidResponse(msg) | LlmError::SerializationError(msg) => {
                ModelError::InvalidResponse(msg)
            }
            LlmError::ProviderError(msg) | LlmError::ConfigError(msg) => ModelError::Provider(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::RateLimitExceeded("slow down".into()).is_retryable());
        assert!(LlmError::ServiceUnavailable("502".into()).is_retryable());
        assert!(!LlmError::AuthenticationError("bad key".into()).is_retryable());
        assert!(!LlmError::InvalidResponse("garbage".into()).is_retryable());
    }

    #[test]
    fn test_conversion_to_model_error() {
        assert_eq!(
            ModelError::from(LlmError::ApiKeyNotFound("GROQ_API_KEY".into())),
            ModelError::Authentication("GROQ_API_KEY".into())
        );
        assert_eq!(
            ModelError::from(LlmError::RateLimitExceeded("429".into())),
            ModelError::RateLimited("429".into())
        );
        assert!(matches!(
            ModelError::from(LlmError::ProviderError("boom".into())),
            ModelError::Provider(_)
        ));
    }
}
