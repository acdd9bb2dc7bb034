//! AI primitives for ploughman.
//!
//! This crate provides the text-completion capability used by the fortune
//! tool and the intent router:
//!
//! - **Backend**: the `LlmBackend` trait and request/response types
//! - **LLM Call**: single-shot inference bounded by a timeout
//! - **OpenAI-compatible client**: the concrete HTTP backend

pub mod backend;
pub mod error;
pub mod llm_call;
pub mod openai_compat;

pub use backend::{
    DEFAULT_MODEL, LlmBackend, LlmBackendConfig, LlmProvider, LlmRequest, LlmResponse, ModelSpec,
    TokenUsage,
};
pub use error::LlmError;
pub use llm_call::{LlmCall, LlmCallResult, LlmInvocationId};
pub use openai_compat::OpenAiCompatBackend;
