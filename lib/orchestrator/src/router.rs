//! Intent routing: deciding which tool, if any, answers an utterance.

use crate::error::RouterError;
use async_trait::async_trait;
use ploughman_ai::{LlmBackend, LlmCall, ModelSpec};
use ploughman_tools::{ToolDefinition, ToolInvocation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// What to do with an utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
    /// Run a tool and answer with its result.
    Invoke(ToolInvocation),
    /// Answer directly.
    Reply(String),
}

/// Decides how an utterance is answered.
#[async_trait]
pub trait IntentRouter: Send + Sync {
    /// Picks a tool from `catalog` or a direct reply.
    ///
    /// # Errors
    ///
    /// Returns an error if no decision could be made.
    async fn route(
        &self,
        utterance: &str,
        catalog: &[ToolDefinition],
    ) -> Result<RoutingDecision, RouterError>;
}

/// Router settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Model used for routing; the backend's default when unset.
    #[serde(default)]
    pub model: Option<String>,
}

const SYSTEM_PROMPT: &str = "You route requests for a data assistant. \
Choose at most one tool from the catalog. \
Answer with a single JSON object and nothing else: \
{\"tool\": \"<name>\", \"arguments\": {...}} to run a tool, or \
{\"reply\": \"<text>\"} to answer directly.";

/// Asks a language model to pick the tool.
pub struct LlmIntentRouter {
    backend: Arc<dyn LlmBackend>,
    model: ModelSpec,
    timeout: Duration,
}

impl LlmIntentRouter {
    /// Creates a router.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, model: ModelSpec, timeout: Duration) -> Self {
        Self {
            backend,
            model,
            timeout,
        }
    }
}

fn build_prompt(utterance: &str, catalog: &[ToolDefinition]) -> String {
    let tools: Vec<JsonValue> = catalog
        .iter()
        .map(|def| {
            json!({
                "name": def.name,
                "description": def.description,
                "parameters": def.input_schema,
            })
        })
        .collect();
    format!(
        "Tool catalog:\n{}\n\nRequest:\n{utterance}",
        JsonValue::Array(tools)
    )
}

#[async_trait]
impl IntentRouter for LlmIntentRouter {
    #[instrument(skip(self, utterance, catalog), fields(model = %self.model, tools = catalog.len()))]
    async fn route(
        &self,
        utterance: &str,
        catalog: &[ToolDefinition],
    ) -> Result<RoutingDecision, RouterError> {
        let result = LlmCall::new(build_prompt(utterance, catalog), self.model.clone())
            .with_system_prompt(SYSTEM_PROMPT)
            .with_temperature(0.0)
            .execute(self.backend.as_ref(), self.timeout)
            .await
            .map_err(|e| RouterError::BackendFailed {
                reason: e.to_string(),
            })?;

        let decision = parse_decision(&result.content)?;
        debug!(?decision, "routed");
        Ok(decision)
    }
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    tool: Option<String>,
    #[serde(default, alias = "parameters")]
    arguments: Option<JsonValue>,
    #[serde(default)]
    reply: Option<String>,
}

/// Drops `<think>...</think>` blocks, including an unterminated one.
fn strip_reasoning(text: &str) -> String {
    let mut rest = text;
    let mut kept = String::new();
    while let Some(start) = rest.find("<think>") {
        kept.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    kept.push_str(rest);
    kept
}

/// Reads a routing decision out of model output.
///
/// Output with no JSON object in it is taken as a direct reply.
///
/// # Errors
///
/// Returns [`RouterError::UnparseableDecision`] if the JSON is malformed,
/// cut off, or names neither a tool nor a reply.
pub fn parse_decision(text: &str) -> Result<RoutingDecision, RouterError> {
    let cleaned = strip_reasoning(text);
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(RouterError::UnparseableDecision {
            reason: "empty answer".to_string(),
        });
    }
    let Some(start) = cleaned.find('{') else {
        return Ok(RoutingDecision::Reply(cleaned.to_string()));
    };
    // An opening brace without a closing one is a cut-off decision.
    let end = match cleaned.rfind('}') {
        Some(end) if end > start => end,
        _ => {
            return Err(RouterError::UnparseableDecision {
                reason: "unterminated JSON object".to_string(),
            });
        }
    };

    let raw: RawDecision = serde_json::from_str(&cleaned[start..=end]).map_err(|e| {
        RouterError::UnparseableDecision {
            reason: e.to_string(),
        }
    })?;

    if let Some(tool) = raw.tool {
        let parameters = match raw.arguments {
            None | Some(JsonValue::Null) => Map::new(),
            Some(JsonValue::Object(map)) => map,
            // Some servers encode arguments as a JSON string.
            Some(JsonValue::String(encoded)) => serde_json::from_str(&encoded).map_err(|e| {
                RouterError::UnparseableDecision {
                    reason: format!("arguments: {e}"),
                }
            })?,
            Some(other) => {
                return Err(RouterError::UnparseableDecision {
                    reason: format!("arguments must be an object, got {other}"),
                });
            }
        };
        return Ok(RoutingDecision::Invoke(ToolInvocation { tool, parameters }));
    }

    raw.reply
        .map(RoutingDecision::Reply)
        .ok_or_else(|| RouterError::UnparseableDecision {
            reason: "neither 'tool' nor 'reply' present".to_string(),
        })
}
