//! Fan-out execution across every configured target.
//!
//! A broadcast issues one call per target concurrently and waits for all of
//! them. Each call is bounded by the query timeout and folded into a value,
//! so one slow or failing target never hides the others.

use crate::connector::{ConnectorFactory, Rows, SqlConnector};
use crate::error::ConnectorError;
use crate::target::{DatabaseTarget, DatabaseTargetRegistry};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Upper bound on a single target call, in seconds.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    /// Pool size per target.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_query_timeout_secs() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    4
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: default_query_timeout_secs(),
            max_connections: default_max_connections(),
        }
    }
}

impl FanoutConfig {
    /// The per-call timeout.
    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// A failed target call, as recorded in a [`FanoutResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    /// Human-readable message.
    pub error: String,
    /// Backend detail, when there is any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl From<&ConnectorError> for TargetFailure {
    fn from(err: &ConnectorError) -> Self {
        Self {
            error: err.to_string(),
            trace: err.trace().map(str::to_string),
        }
    }
}

/// What one target produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetOutcome {
    /// The query succeeded.
    Rows(Rows),
    /// The query failed on this target only.
    Failed(TargetFailure),
}

impl TargetOutcome {
    /// Returns whether this target failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-target outcomes of a broadcast, keyed by logical name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FanoutResult {
    outcomes: BTreeMap<String, TargetOutcome>,
}

impl FanoutResult {
    /// Returns the outcome recorded for `target`.
    #[must_use]
    pub fn get(&self, target: &str) -> Option<&TargetOutcome> {
        self.outcomes.get(target)
    }

    /// Iterates outcomes ordered by target name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of targets that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_failure()).count()
    }

    /// Returns the number of targets addressed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns whether no targets were addressed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

impl FromIterator<(String, TargetOutcome)> for FanoutResult {
    fn from_iter<I: IntoIterator<Item = (String, TargetOutcome)>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Runs SQL against one or all configured targets.
pub struct FanoutEngine {
    registry: Arc<DatabaseTargetRegistry>,
    connectors: HashMap<String, Arc<dyn SqlConnector>>,
    query_timeout: Duration,
}

impl FanoutEngine {
    /// Creates an engine with one connector per registered target.
    #[must_use]
    pub fn new(
        registry: Arc<DatabaseTargetRegistry>,
        factory: &dyn ConnectorFactory,
        query_timeout: Duration,
    ) -> Self {
        let connectors = registry
            .iter()
            .map(|target| (target.name.clone(), factory.connector_for(target)))
            .collect();
        Self {
            registry,
            connectors,
            query_timeout,
        }
    }

    /// The targets this engine addresses.
    #[must_use]
    pub fn registry(&self) -> &DatabaseTargetRegistry {
        &self.registry
    }

    /// Runs `sql` on every target concurrently.
    ///
    /// The result has exactly one entry per registered target, whatever
    /// happened on the others.
    #[instrument(skip(self, sql), fields(targets = self.registry.len()))]
    pub async fn broadcast_query(&self, sql: &str) -> FanoutResult {
        let calls = self.registry.iter().map(|target| async move {
            let outcome = match self.query(target, sql).await {
                Ok(rows) => {
                    debug!(target_name = %target.name, rows = rows.len(), "target answered");
                    TargetOutcome::Rows(rows)
                }
                Err(e) => {
                    warn!(target_name = %target.name, error = %e, "target failed");
                    TargetOutcome::Failed(TargetFailure::from(&e))
                }
            };
            (target.name.clone(), outcome)
        });

        let result: FanoutResult = join_all(calls).await.into_iter().collect();
        debug!(
            targets = result.len(),
            failures = result.failure_count(),
            "broadcast finished"
        );
        result
    }

    /// Runs a row-returning statement on one target.
    ///
    /// # Errors
    ///
    /// Returns the connector's error, or [`ConnectorError::Timeout`].
    pub async fn query(&self, target: &DatabaseTarget, sql: &str) -> Result<Rows, ConnectorError> {
        let connector = self.connector(target)?;
        self.bounded(connector.query(sql)).await
    }

    /// Runs a statement for its effect on one target.
    ///
    /// # Errors
    ///
    /// Returns the connector's error, or [`ConnectorError::Timeout`].
    pub async fn execute(&self, target: &DatabaseTarget, sql: &str) -> Result<u64, ConnectorError> {
        let connector = self.connector(target)?;
        self.bounded(connector.execute(sql)).await
    }

    fn connector(&self, target: &DatabaseTarget) -> Result<&Arc<dyn SqlConnector>, ConnectorError> {
        self.connectors
            .get(&target.name)
            .ok_or_else(|| ConnectorError::ConnectionFailed {
                reason: format!("no connector for target '{}'", target.name),
            })
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ConnectorError>>,
    ) -> Result<T, ConnectorError> {
        tokio::time::timeout(self.query_timeout, call)
            .await
            .unwrap_or(Err(ConnectorError::Timeout {
                after_secs: self.query_timeout.as_secs(),
            }))
    }
}
