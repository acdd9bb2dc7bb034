//! Request orchestration.
//!
//! One utterance in, one response string out. Every failure along the way
//! ends up in the response text; nothing is returned as an error.

use crate::router::{IntentRouter, RoutingDecision};
use ploughman_conversation::SessionContext;
use ploughman_tools::{ToolError, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Routes utterances to tools and records the turns.
pub struct Orchestrator {
    router: Arc<dyn IntentRouter>,
    tools: Arc<ToolRegistry>,
}

impl Orchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(router: Arc<dyn IntentRouter>, tools: Arc<ToolRegistry>) -> Self {
        Self { router, tools }
    }

    /// The tools requests can reach.
    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answers `utterance` and appends the turn to the active conversation.
    ///
    /// Blank utterances are ignored: nothing is routed or recorded and
    /// `None` is returned.
    #[instrument(skip(self, context, utterance), fields(session_id = %context.session_id()))]
    pub async fn handle(&self, context: &mut SessionContext, utterance: &str) -> Option<String> {
        if utterance.trim().is_empty() {
            debug!("ignoring blank utterance");
            return None;
        }

        let response = self.respond(utterance).await;
        context.append_turn(utterance, response.clone());
        Some(response)
    }

    /// Produces the response for `utterance` without touching any session.
    pub async fn respond(&self, utterance: &str) -> String {
        let catalog = self.tools.definitions();
        let decision = match self.router.route(utterance, &catalog).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "routing failed");
                return format!("[RoutingFailed] {e}");
            }
        };

        match decision {
            RoutingDecision::Reply(text) => text,
            RoutingDecision::Invoke(invocation) => match self.tools.dispatch(&invocation).await {
                Ok(output) => output.to_response_text(),
                Err(e) => describe_tool_error(&e),
            },
        }
    }
}

/// Response text for a failed tool: kind, message and any backend trace.
#[must_use]
pub fn describe_tool_error(err: &ToolError) -> String {
    match err.trace() {
        Some(trace) => format!("[{}] {err}\n{trace}", err.kind()),
        None => format!("[{}] {err}", err.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterError;
    use async_trait::async_trait;
    use ploughman_tools::{
        DepartureTool, NO_DATA_MESSAGE, PngChartRenderer, SequenceRandom, ToolDefinition,
        ToolInvocation, VisualizeTool,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed decision and counts calls.
    struct FixedRouter {
        decision: Result<RoutingDecision, RouterError>,
        calls: AtomicUsize,
    }

    impl FixedRouter {
        fn new(decision: Result<RoutingDecision, RouterError>) -> Arc<Self> {
            Arc::new(Self {
                decision,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IntentRouter for FixedRouter {
        async fn route(
            &self,
            _utterance: &str,
            _catalog: &[ToolDefinition],
        ) -> Result<RoutingDecision, RouterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.decision.clone()
        }
    }

    fn tools() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(DepartureTool::new(Arc::new(SequenceRandom::new(vec![1]))));
        registry.register(VisualizeTool::new(Arc::new(PngChartRenderer::default())));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn tool_result_becomes_the_turn() {
        let router = FixedRouter::new(Ok(RoutingDecision::Invoke(
            ToolInvocation::new("get_time").with_param("name", json!("Alice")),
        )));
        let orchestrator = Orchestrator::new(router, tools());
        let mut context = SessionContext::new();

        let response = orchestrator
            .handle(&mut context, "When does Alice leave?")
            .await;

        assert_eq!(
            response.as_deref(),
            Some("Alice is expected to leave at 7.00 PM today")
        );
        let turn = context.conversation().last_turn().expect("turn recorded");
        assert_eq!(turn.utterance, "When does Alice leave?");
        assert_eq!(turn.response, "Alice is expected to leave at 7.00 PM today");
    }

    #[tokio::test]
    async fn blank_utterance_is_ignored() {
        let router = FixedRouter::new(Ok(RoutingDecision::Reply("hi".to_string())));
        let orchestrator = Orchestrator::new(router.clone(), tools());
        let mut context = SessionContext::new();

        assert_eq!(orchestrator.handle(&mut context, "   \n").await, None);
        assert!(context.conversation().is_empty());
        assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn routing_failure_is_reported_in_the_turn() {
        let router = FixedRouter::new(Err(RouterError::BackendFailed {
            reason: "timed out".to_string(),
        }));
        let orchestrator = Orchestrator::new(router, tools());
        let mut context = SessionContext::new();

        let response = orchestrator.handle(&mut context, "hello").await.expect("answered");

        assert!(response.starts_with("[RoutingFailed]"));
        assert!(response.contains("timed out"));
        assert_eq!(context.conversation().len(), 1);
    }

    #[tokio::test]
    async fn tool_error_embeds_kind_and_message() {
        let router = FixedRouter::new(Ok(RoutingDecision::Invoke(ToolInvocation::new(
            "send_email",
        ))));
        let orchestrator = Orchestrator::new(router, tools());
        let mut context = SessionContext::new();

        let response = orchestrator.handle(&mut context, "mail Bob").await.expect("answered");

        assert_eq!(response, "[NotFound] tool not found: send_email");
    }

    #[tokio::test]
    async fn empty_visualization_is_a_plain_reply() {
        let router = FixedRouter::new(Ok(RoutingDecision::Invoke(
            ToolInvocation::new("visualize_data")
                .with_param("data", json!([]))
                .with_param("chart_type", json!("bar")),
        )));
        let orchestrator = Orchestrator::new(router, tools());
        let mut context = SessionContext::new();

        let response = orchestrator.handle(&mut context, "chart it").await;

        assert_eq!(response.as_deref(), Some(NO_DATA_MESSAGE));
    }

    #[tokio::test]
    async fn chart_is_returned_inline() {
        let router = FixedRouter::new(Ok(RoutingDecision::Invoke(
            ToolInvocation::new("visualize_data").with_param("data", json!([1, 3, 2])),
        )));
        let orchestrator = Orchestrator::new(router, tools());

        let response = orchestrator.respond("plot").await;

        assert!(response.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn trace_is_appended() {
        let err = ToolError::QueryFailed {
            target: "sales".to_string(),
            message: "boom".to_string(),
            trace: Some("SQLSTATE 42000".to_string()),
        };
        assert_eq!(
            describe_tool_error(&err),
            "[QueryFailed] query failed on sales: boom\nSQLSTATE 42000"
        );
    }
}
