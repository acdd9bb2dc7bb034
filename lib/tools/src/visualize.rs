//! `visualize_data`: draws a chart from rows of data.

use crate::chart::{ChartKind, Table};
use crate::error::ToolError;
use crate::registry::{ToolDefinition, ToolHandler, ToolOutput};
use crate::render::ChartRenderer;
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;
use tracing::debug;

/// Registered name.
pub const TOOL_NAME: &str = "visualize_data";

/// Reply when there is nothing to draw.
pub const NO_DATA_MESSAGE: &str = "No data to visualize";

/// Renders tabular data as an inline image.
pub struct VisualizeTool {
    renderer: Arc<dyn ChartRenderer>,
}

impl VisualizeTool {
    /// Creates the tool.
    #[must_use]
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl ToolHandler for VisualizeTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(TOOL_NAME, "Draw a line, bar or pie chart from rows of data")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "data": {
                        "type": "array",
                        "description": "Rows as objects, arrays or single values"
                    },
                    "chart_type": {
                        "type": "string",
                        "enum": ["line", "bar", "pie"],
                        "default": "line"
                    }
                },
                "required": ["data"]
            }))
    }

    async fn call(&self, parameters: &Map<String, JsonValue>) -> Result<ToolOutput, ToolError> {
        let records = match parameters.get("data") {
            Some(JsonValue::Array(records)) => records,
            Some(_) => return Err(ToolError::invalid_input(TOOL_NAME, "'data' must be an array")),
            None => return Err(ToolError::invalid_input(TOOL_NAME, "missing 'data'")),
        };

        let kind = match parameters.get("chart_type").and_then(JsonValue::as_str) {
            Some(name) => ChartKind::parse(name).unwrap_or_else(|| {
                debug!(chart_type = name, "unknown chart type, drawing a line chart");
                ChartKind::default()
            }),
            None => ChartKind::default(),
        };

        let table = Table::from_records(records);
        if table.is_empty() {
            return Ok(ToolOutput::Text(NO_DATA_MESSAGE.to_string()));
        }

        let renderer = Arc::clone(&self.renderer);
        let mime = renderer.mime_type().to_string();
        let bytes = tokio::task::spawn_blocking(move || renderer.render(&table, kind))
            .await
            .map_err(|e| ToolError::UpstreamUnavailable {
                service: "chart rendering".to_string(),
                reason: e.to_string(),
            })?
            .map_err(|e| ToolError::UpstreamUnavailable {
                service: "chart rendering".to_string(),
                reason: e.to_string(),
            })?;

        Ok(ToolOutput::Image { mime, bytes })
    }
}
