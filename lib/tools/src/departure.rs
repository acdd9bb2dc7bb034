//! `get_time`: estimated departure time for a person.

use crate::error::ToolError;
use crate::random::RandomSource;
use crate::registry::{ToolDefinition, ToolHandler, ToolOutput, required_str};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;

/// Registered name.
pub const TOOL_NAME: &str = "get_time";

/// The times a departure estimate is drawn from.
pub const DEPARTURE_TIMES: [&str; 3] = ["6.00 PM", "7.00 PM", "8.30 PM"];

/// Picks one of [`DEPARTURE_TIMES`] at random.
pub struct DepartureTool {
    random: Arc<dyn RandomSource>,
}

impl DepartureTool {
    /// Creates the tool.
    #[must_use]
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }
}

#[async_trait]
impl ToolHandler for DepartureTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(TOOL_NAME, "Estimate when a person will leave work today")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Person's name" }
                },
                "required": ["name"]
            }))
    }

    async fn call(&self, parameters: &Map<String, JsonValue>) -> Result<ToolOutput, ToolError> {
        let name = required_str(TOOL_NAME, parameters, "name")?;
        let pick = self.random.pick(DEPARTURE_TIMES.len());
        let time = DEPARTURE_TIMES
            .get(pick)
            .ok_or_else(|| ToolError::UpstreamUnavailable {
                service: "random source".to_string(),
                reason: format!("index {pick} out of range"),
            })?;
        Ok(ToolOutput::Text(format!(
            "{name} is expected to leave at {time} today"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{SequenceRandom, ThreadRandom};

    fn params(name: &str) -> Map<String, JsonValue> {
        [("name".to_string(), json!(name))].into_iter().collect()
    }

    #[tokio::test]
    async fn uses_the_picked_time() {
        let tool = DepartureTool::new(Arc::new(SequenceRandom::new(vec![2])));

        let output = tool.call(&params("Alice")).await.expect("should succeed");

        assert_eq!(
            output,
            ToolOutput::Text("Alice is expected to leave at 8.30 PM today".to_string())
        );
    }

    #[tokio::test]
    async fn always_one_of_the_fixed_times() {
        let tool = DepartureTool::new(Arc::new(ThreadRandom));
        for _ in 0..20 {
            let ToolOutput::Text(text) = tool.call(&params("Bob")).await.expect("ok") else {
                panic!("expected text");
            };
            assert!(DEPARTURE_TIMES.iter().any(|t| text.contains(t)));
        }
    }

    struct OutOfRange;

    impl RandomSource for OutOfRange {
        fn pick(&self, len: usize) -> usize {
            len
        }
    }

    #[tokio::test]
    async fn out_of_range_pick_is_an_error() {
        let tool = DepartureTool::new(Arc::new(OutOfRange));

        let err = tool.call(&params("Carol")).await.unwrap_err();

        assert_eq!(err.kind(), "UpstreamUnavailable");
        assert!(err.to_string().contains("index 3 out of range"));
    }

    #[tokio::test]
    async fn missing_name_is_invalid_input() {
        let tool = DepartureTool::new(Arc::new(ThreadRandom));
        let err = tool.call(&Map::new()).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }
}
