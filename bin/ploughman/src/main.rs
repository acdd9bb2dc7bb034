use ploughman::{config::AppConfig, console::Console, error::AppError};
use ploughman_ai::{LlmBackend, OpenAiCompatBackend};
use ploughman_database::{DatabaseTargetRegistry, FanoutEngine, MySqlConnectorFactory};
use ploughman_orchestrator::{LlmIntentRouter, Orchestrator, SessionHub};
use ploughman_tools::{PngChartRenderer, ThreadRandom, ToolDependencies, create_registry};
use rootcause::Report;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Report<AppError>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from file and environment
    let config = AppConfig::load().map_err(|e| AppError::Config {
        reason: e.to_string(),
    })?;
    tracing::info!(targets = config.databases.len(), "Loaded configuration");

    let targets = DatabaseTargetRegistry::from_config(config.databases.clone()).map_err(|e| {
        AppError::Registry {
            reason: e.to_string(),
        }
    })?;
    if targets.is_empty() {
        tracing::warn!("No database targets configured; database tools will fail");
    }

    // Pools connect lazily on first use
    let query_timeout = config.fanout.query_timeout();
    let connectors = MySqlConnectorFactory::new(config.fanout.max_connections, query_timeout);
    let engine = Arc::new(FanoutEngine::new(
        Arc::new(targets),
        &connectors,
        query_timeout,
    ));

    let llm: Arc<dyn LlmBackend> =
        Arc::new(OpenAiCompatBackend::new(&config.ai).map_err(|e| AppError::Backend {
            reason: e.to_string(),
        })?);
    tracing::info!(
        base_url = %config.ai.base_url,
        model = %config.ai.model,
        "Created completion backend"
    );

    let tools = create_registry(ToolDependencies {
        engine,
        llm: Arc::clone(&llm),
        fortune_model: config.ai.model_spec(),
        llm_timeout: config.ai.timeout(),
        random: Arc::new(ThreadRandom),
        renderer: Arc::new(PngChartRenderer::default()),
        config: config.tools.clone(),
    });
    tracing::info!(tools = tools.len(), "Registered tools");

    let router = LlmIntentRouter::new(llm, config.router_model(), config.ai.timeout());
    let orchestrator = Orchestrator::new(Arc::new(router), Arc::new(tools));
    let console = Console::new(Arc::new(SessionHub::new(Arc::new(orchestrator))));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = console.run(stdin, tokio::io::stdout()) => {
            result.map_err(|e| AppError::Io {
                reason: e.to_string(),
            })?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
