//! Error Types - Prebuilt Component Errors
//!
//! # Error Categories
//!
//! - **Tool Errors** - lookup, validation and execution failures
//! - **Message Errors** - a message log in state could not be decoded
//! - **Graph Errors** - underlying graph construction or execution errors
//!
//! Inside the tool node, tool errors are reported back to the model as tool
//! messages instead of failing the run.

use thiserror::Error;
use waypoint_core::GraphError;

/// Result type for prebuilt operations
pub type Result<T> = std::result::Result<T, PrebuiltError>;

/// Errors that can occur in prebuilt components
#[derive(Error, Debug)]
pub enum PrebuiltError {
    /// No tool with this name is registered
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool execution error
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    /// Tool validation error
    #[error("Tool validation failed: {0}")]
    ToolValidation(String),

    /// Invalid tool input
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    /// Message parsing error
    #[error("Message parsing failed: {0}")]
    MessageParsing(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Graph error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

impl From<PrebuiltError> for GraphError {
    fn from(err: PrebuiltError) -> Self {
        match err {
            PrebuiltError::Graph(inner) => inner,
            PrebuiltError::Serialization(inner) => GraphError::Serialization(inner),
            other => GraphError::Execution(other.to_string()),
        }
    }
}
