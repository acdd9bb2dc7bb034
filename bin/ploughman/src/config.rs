//! Centralized application configuration.
//!
//! Composed from the library crates' own config structs and loaded via the
//! `config` crate: an optional TOML file, overridden by environment
//! variables such as `PLOUGHMAN__AI__BASE_URL`.

use ploughman_ai::{LlmBackendConfig, ModelSpec};
use ploughman_database::{DatabaseTargetConfig, FanoutConfig};
use ploughman_orchestrator::RouterConfig;
use ploughman_tools::ToolsConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "PLOUGHMAN_CONFIG";

/// Configuration file read when [`CONFIG_PATH_VAR`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "ploughman.toml";

/// Prefix of overriding environment variables.
pub const ENV_PREFIX: &str = "PLOUGHMAN";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Database targets, in fan-out order.
    #[serde(default)]
    pub databases: Vec<DatabaseTargetConfig>,

    /// Fan-out timeouts and pool sizes.
    #[serde(default)]
    pub fanout: FanoutConfig,

    /// Completion backend.
    #[serde(default)]
    pub ai: LlmBackendConfig,

    /// Tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Intent router settings.
    #[serde(default)]
    pub router: RouterConfig,
}

impl AppConfig {
    /// Loads configuration from the file named by `PLOUGHMAN_CONFIG`
    /// (default `ploughman.toml`) and the environment.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or parsed.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Loads configuration from `path` and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Model the intent router runs on.
    ///
    /// Falls back to the backend's default model.
    #[must_use]
    pub fn router_model(&self) -> ModelSpec {
        match &self.router.model {
            Some(model) => ModelSpec {
                provider: self.ai.provider,
                model: model.clone(),
            },
            None => self.ai.model_spec(),
        }
    }
}
