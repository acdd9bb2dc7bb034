//! The standard tool set.

use crate::database::{CreateTableTool, ExecuteQueryTool, ListTablesTool, ToolsConfig};
use crate::departure::DepartureTool;
use crate::fortune::FortuneTool;
use crate::random::RandomSource;
use crate::registry::ToolRegistry;
use crate::render::ChartRenderer;
use crate::visualize::VisualizeTool;
use ploughman_ai::{LlmBackend, ModelSpec};
use ploughman_database::FanoutEngine;
use std::sync::Arc;
use std::time::Duration;

/// Capabilities the standard tools are built on.
pub struct ToolDependencies {
    /// Database access for the three database tools.
    pub engine: Arc<FanoutEngine>,
    /// Completion backend for fortune analysis.
    pub llm: Arc<dyn LlmBackend>,
    /// Model used for fortune analysis.
    pub fortune_model: ModelSpec,
    /// Upper bound on one completion call.
    pub llm_timeout: Duration,
    /// Source of departure-time picks.
    pub random: Arc<dyn RandomSource>,
    /// Chart renderer.
    pub renderer: Arc<dyn ChartRenderer>,
    /// Tool settings.
    pub config: ToolsConfig,
}

/// Builds a registry holding all six tools.
#[must_use]
pub fn create_registry(deps: ToolDependencies) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(DepartureTool::new(deps.random));
    registry.register(FortuneTool::new(
        deps.llm,
        deps.fortune_model,
        deps.llm_timeout,
    ));

    registry.register(ListTablesTool::new(Arc::clone(&deps.engine)));
    registry.register(CreateTableTool::new(Arc::clone(&deps.engine), &deps.config));
    registry.register(ExecuteQueryTool::new(deps.engine));

    registry.register(VisualizeTool::new(deps.renderer));

    registry
}
