//! Current-time tool

use super::{Tool, ToolInput, ToolOutput};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Reports the current UTC time
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockTool;

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> &str {
        "clock"
    }

    fn description(&self) -> &str {
        "Returns the current date and time in UTC (RFC 3339) and as a Unix timestamp"
    }

    fn input_schema(&self) -> Option<serde_json::Value> {
        Some(json!({"type": "object", "properties": {}}))
    }

    async fn execute(&self, _input: ToolInput) -> Result<ToolOutput> {
        let now = Utc::now();
        Ok(json!({
            "utc": now.to_rfc3339_opts(SecondsFormat::Secs, true),
            "unix": now.timestamp(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clock_reports_utc() {
        let before = Utc::now().timestamp();
        let output = ClockTool.execute(json!({})).await.unwrap();
        let unix = output["unix"].as_i64().unwrap();
        assert!(unix >= before);
        assert!(output["utc"].as_str().unwrap().ends_with('Z'));
    }
}
