//! Tool registry and dispatch.
//!
//! Tools are looked up by name and invoked with a mapping of named
//! parameters. The registry is built once at startup and is read-only
//! afterwards, so it can be shared across requests behind an `Arc`.

use crate::error::ToolError;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Definition of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for input parameters.
    pub input_schema: JsonValue,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: JsonValue) -> Self {
        self.input_schema = schema;
        self
    }
}

/// A request to run one tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Registered tool name.
    pub tool: String,
    /// Named parameters, in the order given.
    #[serde(default)]
    pub parameters: Map<String, JsonValue>,
}

impl ToolInvocation {
    /// Creates an invocation with no parameters.
    #[must_use]
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            parameters: Map::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// A successful tool result.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Plain text for the user.
    Text(String),
    /// A structured payload.
    Json(JsonValue),
    /// Encoded image bytes.
    Image { mime: String, bytes: Vec<u8> },
}

impl ToolOutput {
    /// Renders the output as response text.
    ///
    /// Images become an inline `data:` URI.
    #[must_use]
    pub fn to_response_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Image { mime, bytes } => {
                format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
            }
        }
    }
}

/// A runnable tool.
///
/// Tools carry no state between calls.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Returns the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Runs the tool.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] describing why the tool could not produce a
    /// result.
    async fn call(&self, parameters: &Map<String, JsonValue>) -> Result<ToolOutput, ToolError>;
}

/// Registry of available tools.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registers a tool under its definition's name, replacing any tool
    /// already registered there.
    pub fn register(&mut self, handler: impl ToolHandler + 'static) {
        let name = handler.definition().name;
        if self.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            warn!(tool = %name, "tool registered twice, keeping the latest");
        }
    }

    /// Gets a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    /// Returns all tool definitions, ordered by name.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.handlers.values().map(|h| h.definition()).collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Converts definitions to the function-calling format expected by LLM
    /// APIs.
    #[must_use]
    pub fn to_llm_format(&self) -> Vec<JsonValue> {
        self.definitions()
            .into_iter()
            .map(|def| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": def.name,
                        "description": def.description,
                        "parameters": def.input_schema
                    }
                })
            })
            .collect()
    }

    /// Runs the named tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] for an unknown name, or whatever the
    /// tool itself returns.
    #[instrument(skip(self, invocation), fields(tool = %invocation.tool))]
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        let handler = self
            .handlers
            .get(&invocation.tool)
            .ok_or_else(|| ToolError::NotFound {
                name: invocation.tool.clone(),
            })?;

        let result = handler.call(&invocation.parameters).await;
        match &result {
            Ok(_) => debug!("tool succeeded"),
            Err(e) => warn!(kind = e.kind(), error = %e, "tool failed"),
        }
        result
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reads a required string parameter.
pub(crate) fn required_str<'a>(
    tool: &str,
    parameters: &'a Map<String, JsonValue>,
    key: &str,
) -> Result<&'a str, ToolError> {
    match parameters.get(key) {
        Some(JsonValue::String(s)) => Ok(s),
        Some(_) => Err(ToolError::invalid_input(
            tool,
            format!("'{key}' must be a string"),
        )),
        None => Err(ToolError::invalid_input(tool, format!("missing '{key}'"))),
    }
}

/// Reads a required object parameter.
pub(crate) fn required_object<'a>(
    tool: &str,
    parameters: &'a Map<String, JsonValue>,
    key: &str,
) -> Result<&'a Map<String, JsonValue>, ToolError> {
    match parameters.get(key) {
        Some(JsonValue::Object(map)) => Ok(map),
        Some(_) => Err(ToolError::invalid_input(
            tool,
            format!("'{key}' must be an object"),
        )),
        None => Err(ToolError::invalid_input(tool, format!("missing '{key}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Shout;

    #[async_trait]
    impl ToolHandler for Shout {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("shout", "Upper-cases its input").with_input_schema(json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            }))
        }

        async fn call(
            &self,
            parameters: &Map<String, JsonValue>,
        ) -> Result<ToolOutput, ToolError> {
            let text = required_str("shout", parameters, "text")?;
            Ok(ToolOutput::Text(text.to_uppercase()))
        }
    }

    #[tokio::test]
    async fn dispatch_runs_named_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Shout);

        let output = registry
            .dispatch(&ToolInvocation::new("shout").with_param("text", json!("hey")))
            .await
            .expect("should succeed");

        assert_eq!(output, ToolOutput::Text("HEY".to_string()));
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry
            .dispatch(&ToolInvocation::new("nope"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::NotFound {
                name: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn wrong_parameter_type_is_invalid_input() {
        let mut registry = ToolRegistry::new();
        registry.register(Shout);

        let err = registry
            .dispatch(&ToolInvocation::new("shout").with_param("text", json!(3)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }

    #[test]
    fn llm_format_wraps_functions() {
        let mut registry = ToolRegistry::new();
        registry.register(Shout);

        let catalog = registry.to_llm_format();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0]["type"], "function");
        assert_eq!(catalog[0]["function"]["name"], "shout");
        assert_eq!(catalog[0]["function"]["parameters"]["required"][0], "text");
    }

    #[test]
    fn image_output_is_a_data_uri() {
        let output = ToolOutput::Image {
            mime: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        assert_eq!(output.to_response_text(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn invocation_deserializes_without_parameters() {
        let invocation: ToolInvocation =
            serde_json::from_value(json!({ "tool": "get_time" })).expect("deserialize");
        assert_eq!(invocation, ToolInvocation::new("get_time"));
    }
}
