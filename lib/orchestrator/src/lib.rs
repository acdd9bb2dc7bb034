//! Request orchestration for Ploughman.
//!
//! This crate provides:
//!
//! - **Intent router**: picks a tool (or a direct reply) for an utterance
//! - **Orchestrator**: runs the tool and records the turn
//! - **Session hub**: one serialized session context per client

pub mod error;
pub mod hub;
pub mod orchestrator;
pub mod router;

pub use error::RouterError;
pub use hub::SessionHub;
pub use orchestrator::{Orchestrator, describe_tool_error};
pub use router::{IntentRouter, LlmIntentRouter, RouterConfig, RoutingDecision, parse_decision};
