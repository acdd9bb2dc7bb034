//! Connector trait and related types.
//!
//! Every backend implements [`SqlConnector`], giving the fan-out engine and
//! the tools a uniform way to run text SQL against one target.

use crate::error::ConnectorError;
use crate::target::DatabaseTarget;
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

/// One result row: column name to value, in column order.
pub type Row = Map<String, JsonValue>;

/// The rows a query produced.
pub type Rows = Vec<Row>;

/// Runs SQL text against a single database target.
#[async_trait]
pub trait SqlConnector: Send + Sync {
    /// Runs a statement that returns rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is unreachable or rejects the statement.
    async fn query(&self, sql: &str) -> Result<Rows, ConnectorError>;

    /// Runs a statement for its effect and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is unreachable or rejects the statement.
    async fn execute(&self, sql: &str) -> Result<u64, ConnectorError>;
}

/// Builds one connector per configured target.
pub trait ConnectorFactory: Send + Sync {
    /// Returns a connector for `target`.
    ///
    /// Connecting is lazy: an unreachable target surfaces as an error from
    /// the first call, never from here.
    fn connector_for(&self, target: &DatabaseTarget) -> Arc<dyn SqlConnector>;
}

/// Reads the first column of each row as text.
///
/// `SHOW TABLES` names its single column after the schema, so callers take
/// whatever comes first.
#[must_use]
pub fn first_column_strings(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.values().next())
        .map(|value| match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, JsonValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn first_column_is_read_regardless_of_name() {
        let rows = vec![
            row(&[("Tables_in_sales", json!("orders"))]),
            row(&[("Tables_in_sales", json!("customers"))]),
        ];

        assert_eq!(first_column_strings(&rows), ["orders", "customers"]);
    }

    #[test]
    fn non_string_first_column_is_rendered() {
        let rows = vec![row(&[("n", json!(7)), ("name", json!("x"))])];
        assert_eq!(first_column_strings(&rows), ["7"]);
    }

    #[test]
    fn empty_rows_are_skipped() {
        let rows = vec![Row::new()];
        assert!(first_column_strings(&rows).is_empty());
    }
}
