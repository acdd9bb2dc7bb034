//! LLM Call primitive.
//!
//! Single-shot inference bounded by a timeout. Every completion in the
//! workspace goes through [`LlmCall::execute`] so no caller can wait on a
//! model server forever.

use crate::backend::{LlmBackend, LlmRequest, ModelSpec, TokenUsage};
use crate::error::LlmError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use ulid::Ulid;

/// Unique identifier for an LLM invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmInvocationId(Ulid);

impl LlmInvocationId {
    /// Creates a new invocation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LlmInvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LlmInvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "llm_{}", self.0)
    }
}

/// The result of an LLM Call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallResult {
    /// Unique identifier for this invocation.
    pub id: LlmInvocationId,
    /// The raw text output.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
    /// When the call was made.
    pub timestamp: DateTime<Utc>,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// An LLM Call executor.
#[derive(Debug, Clone)]
pub struct LlmCall {
    request: LlmRequest,
}

impl LlmCall {
    /// Creates a new LLM Call with the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: ModelSpec) -> Self {
        Self {
            request: LlmRequest::new(prompt, model),
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.request = self.request.with_system(system);
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.request = self.request.with_temperature(temperature);
        self
    }

    /// Returns the request this call will send.
    #[must_use]
    pub fn request(&self) -> &LlmRequest {
        &self.request
    }

    /// Sends the request, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or [`LlmError::Timeout`] when the backend
    /// does not answer in time.
    #[instrument(skip(self, backend), fields(backend = backend.name(), model = %self.request.model))]
    pub async fn execute(
        &self,
        backend: &dyn LlmBackend,
        timeout: Duration,
    ) -> Result<LlmCallResult, LlmError> {
        let id = LlmInvocationId::new();
        let started = Instant::now();

        let response = match tokio::time::timeout(timeout, backend.generate(&self.request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(%id, error = %e, "LLM call failed");
                return Err(e);
            }
            Err(_) => {
                warn!(%id, timeout_secs = timeout.as_secs(), "LLM call timed out");
                return Err(LlmError::Timeout {
                    after_secs: timeout.as_secs(),
                });
            }
        };

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(%id, latency_ms, tokens = response.usage.total(), "LLM call completed");

        Ok(LlmCallResult {
            id,
            content: response.content,
            usage: response.usage,
            model: response.model,
            timestamp: Utc::now(),
            latency_ms,
        })
    }
}
