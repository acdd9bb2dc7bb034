//! `analyze_fortune`: free-text reading of birth data by a language model.

use crate::error::ToolError;
use crate::registry::{ToolDefinition, ToolHandler, ToolOutput, required_object};
use async_trait::async_trait;
use ploughman_ai::{LlmBackend, LlmCall, ModelSpec};
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;

/// Registered name.
pub const TOOL_NAME: &str = "analyze_fortune";

/// Sends birth data to the completion backend and returns its answer as is.
pub struct FortuneTool {
    backend: Arc<dyn LlmBackend>,
    model: ModelSpec,
    timeout: Duration,
}

impl FortuneTool {
    /// Creates the tool.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, model: ModelSpec, timeout: Duration) -> Self {
        Self {
            backend,
            model,
            timeout,
        }
    }
}

fn build_prompt(birthday_data: &Map<String, JsonValue>) -> String {
    format!(
        "Following traditional Chinese feng shui, analyse the wealth fortune and \
         prospects indicated by these birth details: {}\n\
         Describe the person's financial outlook and development trends in detail.",
        JsonValue::Object(birthday_data.clone())
    )
}

#[async_trait]
impl ToolHandler for FortuneTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            TOOL_NAME,
            "Analyse wealth fortune from birth details (year, month, day, hour)",
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "birthday_data": {
                    "type": "object",
                    "description": "Birth details, e.g. {\"year\": 1990, \"month\": 5, \"day\": 12, \"hour\": 8}"
                }
            },
            "required": ["birthday_data"]
        }))
    }

    async fn call(&self, parameters: &Map<String, JsonValue>) -> Result<ToolOutput, ToolError> {
        let birthday_data = required_object(TOOL_NAME, parameters, "birthday_data")?;

        let result = LlmCall::new(build_prompt(birthday_data), self.model.clone())
            .execute(self.backend.as_ref(), self.timeout)
            .await
            .map_err(|e| ToolError::UpstreamUnavailable {
                service: format!("text completion ({})", self.backend.name()),
                reason: e.to_string(),
            })?;

        Ok(ToolOutput::Text(result.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ploughman_ai::{LlmError, LlmRequest, LlmResponse, TokenUsage};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBackend {
        requests: Mutex<Vec<LlmRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl LlmBackend for RecordingBackend {
        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            self.requests.lock().expect("lock").push(request.clone());
            if self.fail {
                return Err(LlmError::ProviderUnavailable {
                    provider: "local".to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            Ok(LlmResponse {
                content: "<think>hmm</think> Prosperous years ahead.".to_string(),
                usage: TokenUsage::default(),
                model: request.model.model.clone(),
            })
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn params() -> Map<String, JsonValue> {
        [(
            "birthday_data".to_string(),
            json!({ "year": 1990, "month": 5, "day": 12, "hour": 8 }),
        )]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn passes_model_output_through_unmodified() {
        let backend = Arc::new(RecordingBackend::default());
        let tool = FortuneTool::new(backend.clone(), ModelSpec::default(), Duration::from_secs(5));

        let output = tool.call(&params()).await.expect("should succeed");

        assert_eq!(
            output,
            ToolOutput::Text("<think>hmm</think> Prosperous years ahead.".to_string())
        );
        let requests = backend.requests.lock().expect("lock");
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("\"year\":1990"));
        assert_eq!(requests[0].model, ModelSpec::default());
    }

    #[tokio::test]
    async fn backend_failure_is_upstream_unavailable() {
        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..RecordingBackend::default()
        });
        let tool = FortuneTool::new(backend, ModelSpec::default(), Duration::from_secs(5));

        let err = tool.call(&params()).await.unwrap_err();

        assert_eq!(err.kind(), "UpstreamUnavailable");
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn non_object_birthday_data_is_invalid_input() {
        let backend = Arc::new(RecordingBackend::default());
        let tool = FortuneTool::new(backend.clone(), ModelSpec::default(), Duration::from_secs(5));
        let parameters = [("birthday_data".to_string(), json!("1990-05-12"))]
            .into_iter()
            .collect();

        let err = tool.call(&parameters).await.unwrap_err();

        assert_eq!(err.kind(), "InvalidInput");
        assert!(backend.requests.lock().expect("lock").is_empty());
    }
}
