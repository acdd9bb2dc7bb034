//! LLM backend abstraction.
//!
//! Provides a single text-completion interface over local and hosted
//! OpenAI-compatible servers.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default model used for free-text analysis.
pub const DEFAULT_MODEL: &str = "deepseek-r1-0528-qwen3-8b";

/// Where a model is served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// A model server on the local network (LM Studio, llama.cpp, vLLM).
    #[default]
    Local,
    /// A hosted API that requires a key.
    Remote,
}

impl LlmProvider {
    /// Returns the provider name as used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects the model a completion runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Where the model is served from.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model identifier understood by the server.
    pub model: String,
}

impl ModelSpec {
    /// A model served locally.
    #[must_use]
    pub fn local(model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Local,
            model: model.into(),
        }
    }

    /// A model served by a hosted API.
    #[must_use]
    pub fn remote(model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Remote,
            model: model.into(),
        }
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::local(DEFAULT_MODEL)
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Configuration for an LLM backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmBackendConfig {
    /// Where the default model is served from.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Base URL of the OpenAI-compatible API, including the version segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key, if the server requires one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Default model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Upper bound on a single completion call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:1234/v1".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmBackendConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmBackendConfig {
    /// The model spec requests use unless they pick another.
    #[must_use]
    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec {
            provider: self.provider,
            model: self.model.clone(),
        }
    }

    /// The per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// A request to an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The user prompt.
    pub prompt: String,
    /// System prompt, if any.
    pub system: Option<String>,
    /// Which model to run on.
    pub model: ModelSpec,
    /// Temperature for sampling (0.0 - 1.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Creates a new simple request with just a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: ModelSpec) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A response from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated content.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Text-completion capability.
///
/// Implementations talk to one server; the request's [`ModelSpec`] picks the
/// model on it.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generates a response for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable, rejects the request,
    /// or answers with something that is not a completion.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str;
}
