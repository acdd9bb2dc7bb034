//! OpenAI-compatible chat-completions backend.
//!
//! Works against any server that speaks `POST {base_url}/chat/completions`:
//! LM Studio, llama.cpp, vLLM, and hosted OpenAI-style APIs.

use crate::backend::{LlmBackend, LlmBackendConfig, LlmRequest, LlmResponse, TokenUsage};
use crate::error::LlmError;
use async_trait::async_trait;
use rootcause::Report;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

/// Chat-completions client.
///
/// Does not derive `Debug`, keeping the API key out of logs.
pub struct OpenAiCompatBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    provider: String,
    timeout_secs: u64,
}

impl OpenAiCompatBackend {
    /// Builds a client from configuration.
    ///
    /// The HTTP client's own timeout is set to the configured call timeout,
    /// so a stalled connection is dropped even outside [`crate::LlmCall`].
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or the HTTP client cannot
    /// be constructed.
    pub fn new(config: &LlmBackendConfig) -> Result<Self, Report<LlmError>> {
        let base_url = config.base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "base_url must not be empty".to_string(),
            }
            .into());
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoint: format!("{base_url}/chat/completions"),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            provider: config.provider.to_string(),
            timeout_secs: config.timeout_secs,
        })
    }
}

/// Builds the JSON body for a chat-completions request.
fn build_body(request: &LlmRequest) -> JsonValue {
    let mut messages = Vec::new();
    if let Some(ref system) = request.system {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    let mut body = json!({
        "model": request.model.model,
        "messages": messages,
        "stream": false,
    });
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    body
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Extracts the first choice's text from a chat-completions response.
fn parse_completion(body: JsonValue, requested_model: &str) -> Result<LlmResponse, LlmError> {
    let completion: ChatCompletion =
        serde_json::from_value(body).map_err(|e| LlmError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::ResponseParseFailed {
            reason: "response has no message content".to_string(),
        })?;

    let usage = completion
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        content,
        usage,
        model: completion
            .model
            .unwrap_or_else(|| requested_model.to_string()),
    })
}

#[async_trait]
impl LlmBackend for OpenAiCompatBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        debug!(endpoint = %self.endpoint, model = %request.model, "chat completion request");

        let mut builder = self.http.post(&self.endpoint).json(&build_body(request));
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout {
                    after_secs: self.timeout_secs,
                }
            } else {
                LlmError::ProviderUnavailable {
                    provider: self.provider.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(LlmError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(LlmError::RequestFailed {
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        parse_completion(body, &request.model.model)
    }

    fn name(&self) -> &str {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ModelSpec;

    #[test]
    fn body_includes_system_and_user_messages() {
        let request = LlmRequest::new("what now?", ModelSpec::local("tiny"))
            .with_system("be brief")
            .with_max_tokens(64);

        let body = build_body(&request);

        assert_eq!(body["model"], "tiny");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "what now?");
        assert_eq!(body["max_tokens"], 64);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn parse_reads_first_choice() {
        let body = json!({
            "model": "served-model",
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }],
            "usage": { "prompt_tokens": 5, "completion_tokens": 2 }
        });

        let response = parse_completion(body, "requested").expect("parse");

        assert_eq!(response.content, "hello");
        assert_eq!(response.model, "served-model");
        assert_eq!(response.usage.total(), 7);
    }

    #[test]
    fn parse_rejects_empty_choices() {
        let err = parse_completion(json!({ "choices": [] }), "m").unwrap_err();
        assert!(matches!(err, LlmError::ResponseParseFailed { .. }));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let config = LlmBackendConfig {
            base_url: "/".to_string(),
            ..LlmBackendConfig::default()
        };
        assert!(OpenAiCompatBackend::new(&config).is_err());
    }
}
