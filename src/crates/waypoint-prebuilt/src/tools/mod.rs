//! Tools - callable capabilities offered to a chat model
//!
//! A [`Tool`] is an async function over JSON with a name, a description and an
//! optional JSON schema for its input. A [`ToolRegistry`] holds the tools a
//! graph offers, turns them into [`ToolDefinition`]s for the model, and executes
//! the calls the model asks for.
//!
//! ```rust
//! use async_trait::async_trait;
//! use serde_json::json;
//! use waypoint_prebuilt::{Result, Tool, ToolInput, ToolOutput, ToolRegistry};
//!
//! struct Add;
//!
//! #[async_trait]
//! impl Tool for Add {
//!     fn name(&self) -> &str {
//!         "add"
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Add two numbers"
//!     }
//!
//!     async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
//!         let a = input["a"].as_f64().unwrap_or(0.0);
//!         let b = input["b"].as_f64().unwrap_or(0.0);
//!         Ok(json!({"sum": a + b}))
//!     }
//! }
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Box::new(Add));
//! assert_eq!(registry.list_tools(), vec!["add"]);
//! ```

use crate::error::{PrebuiltError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use waypoint_core::ToolDefinition;

pub mod clock;

pub use clock::ClockTool;

/// Tool input type
pub type ToolInput = Value;

/// Tool output type
pub type ToolOutput = Value;

/// Tool trait for implementing chat tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// Get the input schema (optional)
    fn input_schema(&self) -> Option<Value> {
        None
    }

    /// Execute the tool with the given input
    async fn execute(&self, input: ToolInput) -> Result<ToolOutput>;

    /// Validate input (optional)
    fn validate_input(&self, _input: &ToolInput) -> Result<()> {
        Ok(())
    }

    /// Definition handed to the model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self
                .input_schema()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        }
    }
}

/// Tool registry for managing multiple tools
///
/// Tools are kept in name order so the definitions offered to the model are
/// stable between calls.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Box::new(tool));
        self
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all tool names
    pub fn list_tools(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Definitions of every registered tool
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, input: ToolInput) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| PrebuiltError::ToolNotFound(name.to_string()))?;

        tool.validate_input(&input)?;
        tool.execute(input).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockTool;

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            "mock"
        }

        fn description(&self) -> &str {
            "A mock tool for testing"
        }

        fn validate_input(&self, input: &ToolInput) -> Result<()> {
            if input.get("forbidden").is_some() {
                return Err(PrebuiltError::ToolValidation("forbidden key".into()));
            }
            Ok(())
        }

        async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
            Ok(json!({ "echo": input }))
        }
    }

    #[tokio::test]
    async fn test_tool_registry() {
        let registry = ToolRegistry::new().with_tool(MockTool);

        assert!(registry.get("mock").is_some());
        assert_eq!(registry.list_tools(), vec!["mock"]);

        let input = json!({"test": "value"});
        let output = registry.execute("mock", input.clone()).await.unwrap();
        assert_eq!(output["echo"], input);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_validation() {
        let registry = ToolRegistry::new().with_tool(MockTool);
        assert!(matches!(
            registry.execute("search", json!({})).await.unwrap_err(),
            PrebuiltError::ToolNotFound(_)
        ));
        assert!(matches!(
            registry
                .execute("mock", json!({"forbidden": true}))
                .await
                .unwrap_err(),
            PrebuiltError::ToolValidation(_)
        ));
    }

    #[test]
    fn test_definitions_default_schema() {
        let registry = ToolRegistry::new().with_tool(MockTool);
        let definitions = registry.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "mock");
        assert_eq!(definitions[0].parameters["type"], "object");
    }
}
