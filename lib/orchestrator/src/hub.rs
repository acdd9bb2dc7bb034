//! Per-client session contexts.
//!
//! Each client key owns one [`SessionContext`] behind its own mutex, so
//! requests for the same session run one at a time while different sessions
//! proceed independently.

use crate::orchestrator::Orchestrator;
use ploughman_conversation::SessionContext;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Owns the session contexts of all clients.
pub struct SessionHub {
    orchestrator: Arc<Orchestrator>,
    sessions: Mutex<HashMap<String, Arc<Mutex<SessionContext>>>>,
}

impl SessionHub {
    /// Creates a hub with no sessions.
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the context for `client`, creating it on first use.
    pub async fn session(&self, client: &str) -> Arc<Mutex<SessionContext>> {
        let mut sessions = self.sessions.lock().await;
        Arc::clone(sessions.entry(client.to_string()).or_insert_with(|| {
            debug!(client, "creating session context");
            Arc::new(Mutex::new(SessionContext::new()))
        }))
    }

    /// Handles one utterance for `client`.
    ///
    /// Waits for any request already running on the same session.
    pub async fn handle(&self, client: &str, utterance: &str) -> Option<String> {
        let session = self.session(client).await;
        let mut context = session.lock().await;
        self.orchestrator.handle(&mut context, utterance).await
    }

    /// Runs `f` with exclusive access to the context for `client`.
    pub async fn with_session<R>(
        &self,
        client: &str,
        f: impl FnOnce(&mut SessionContext) -> R,
    ) -> R {
        let session = self.session(client).await;
        let mut context = session.lock().await;
        f(&mut context)
    }

    /// Forgets `client`'s session, returning its final state.
    pub async fn remove(&self, client: &str) -> Option<SessionContext> {
        let session = self.sessions.lock().await.remove(client)?;
        let context = session.lock().await.clone();
        Some(context)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns whether there are no live sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
