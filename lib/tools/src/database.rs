//! Database tools: `show_tables`, `create_table` and `execute_query`.

use crate::error::ToolError;
use crate::registry::{ToolDefinition, ToolHandler, ToolOutput, required_object, required_str};
use async_trait::async_trait;
use ploughman_database::{
    ConnectorError, DatabaseTarget, DdlError, FanoutEngine, create_table_statement,
    first_column_strings,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Registered name of [`ListTablesTool`].
pub const SHOW_TABLES: &str = "show_tables";
/// Registered name of [`CreateTableTool`].
pub const CREATE_TABLE: &str = "create_table";
/// Registered name of [`ExecuteQueryTool`].
pub const EXECUTE_QUERY: &str = "execute_query";

/// Tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Check table and column names before building DDL.
    #[serde(default = "default_validate_identifiers")]
    pub validate_identifiers: bool,
}

fn default_validate_identifiers() -> bool {
    true
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            validate_identifiers: default_validate_identifiers(),
        }
    }
}

fn query_failed(target: &DatabaseTarget, err: &ConnectorError) -> ToolError {
    ToolError::QueryFailed {
        target: target.name.clone(),
        message: err.to_string(),
        trace: err.trace().map(str::to_string),
    }
}

/// Lists the tables of the target whose database name matches.
pub struct ListTablesTool {
    engine: Arc<FanoutEngine>,
}

impl ListTablesTool {
    /// Creates the tool.
    #[must_use]
    pub fn new(engine: Arc<FanoutEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ToolHandler for ListTablesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(SHOW_TABLES, "List all tables in the named database")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "database": { "type": "string", "description": "Database name" }
                },
                "required": ["database"]
            }))
    }

    async fn call(&self, parameters: &Map<String, JsonValue>) -> Result<ToolOutput, ToolError> {
        let database = required_str(SHOW_TABLES, parameters, "database")?;
        let target = self
            .engine
            .registry()
            .find_by_database(database)
            .ok_or_else(|| ToolError::UnknownTarget {
                database: database.to_string(),
            })?;

        let rows = self
            .engine
            .query(target, "SHOW TABLES")
            .await
            .map_err(|e| query_failed(target, &e))?;

        Ok(ToolOutput::Json(json!({
            "database": database,
            "tables": first_column_strings(&rows),
        })))
    }
}

/// Creates a table on the default (first) target.
pub struct CreateTableTool {
    engine: Arc<FanoutEngine>,
    validate_identifiers: bool,
}

impl CreateTableTool {
    /// Creates the tool.
    #[must_use]
    pub fn new(engine: Arc<FanoutEngine>, config: &ToolsConfig) -> Self {
        Self {
            engine,
            validate_identifiers: config.validate_identifiers,
        }
    }
}

#[async_trait]
impl ToolHandler for CreateTableTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(CREATE_TABLE, "Create a table in the default database")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "table_name": { "type": "string" },
                    "columns": {
                        "type": "object",
                        "description": "Column name to SQL type, in column order",
                        "additionalProperties": { "type": "string" }
                    }
                },
                "required": ["table_name", "columns"]
            }))
    }

    async fn call(&self, parameters: &Map<String, JsonValue>) -> Result<ToolOutput, ToolError> {
        let table = required_str(CREATE_TABLE, parameters, "table_name")?;
        let columns = required_object(CREATE_TABLE, parameters, "columns")?;

        let mut column_types = Vec::with_capacity(columns.len());
        for (name, data_type) in columns {
            let data_type = data_type.as_str().ok_or_else(|| {
                ToolError::invalid_input(
                    CREATE_TABLE,
                    format!("type of column '{name}' must be a string"),
                )
            })?;
            column_types.push((name.as_str(), data_type));
        }

        if !self.validate_identifiers {
            warn!(
                kind = "ValidationSkipped",
                table, "building DDL from unvalidated identifiers"
            );
        }
        let sql = create_table_statement(table, column_types, self.validate_identifiers)
            .map_err(|e| match e {
                DdlError::NoColumns => ToolError::invalid_input(CREATE_TABLE, e.to_string()),
                other => ToolError::InvalidIdentifier {
                    reason: other.to_string(),
                },
            })?;

        let target = self
            .engine
            .registry()
            .first()
            .ok_or_else(|| ToolError::UnknownTarget {
                database: "default".to_string(),
            })?;

        self.engine
            .execute(target, &sql)
            .await
            .map_err(|e| query_failed(target, &e))?;

        info!(target_name = %target.name, table, "table created");
        Ok(ToolOutput::Text(format!("Table {table} created")))
    }
}

/// Runs the same SQL on every target.
pub struct ExecuteQueryTool {
    engine: Arc<FanoutEngine>,
}

impl ExecuteQueryTool {
    /// Creates the tool.
    #[must_use]
    pub fn new(engine: Arc<FanoutEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ToolHandler for ExecuteQueryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            EXECUTE_QUERY,
            "Run a SQL statement on every configured database and return the results per database",
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "sql": { "type": "string" }
            },
            "required": ["sql"]
        }))
    }

    async fn call(&self, parameters: &Map<String, JsonValue>) -> Result<ToolOutput, ToolError> {
        let sql = required_str(EXECUTE_QUERY, parameters, "sql")?;
        let result = self.engine.broadcast_query(sql).await;
        Ok(ToolOutput::Json(result.to_json()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ploughman_database::{ConnectorFactory, DatabaseTargetRegistry, Rows, SqlConnector};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers every statement with the same result and records it.
    struct ScriptedConnector {
        result: Result<Rows, ConnectorError>,
        statements: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SqlConnector for ScriptedConnector {
        async fn query(&self, sql: &str) -> Result<Rows, ConnectorError> {
            self.statements.lock().expect("lock").push(sql.to_string());
            self.result.clone()
        }

        async fn execute(&self, sql: &str) -> Result<u64, ConnectorError> {
            self.query(sql).await.map(|_| 0)
        }
    }

    struct Backends {
        connectors: HashMap<String, Arc<ScriptedConnector>>,
    }

    impl Backends {
        fn new(scripts: Vec<(&str, Result<Rows, ConnectorError>)>) -> Self {
            Self {
                connectors: scripts
                    .into_iter()
                    .map(|(name, result)| {
                        (
                            name.to_string(),
                            Arc::new(ScriptedConnector {
                                result,
                                statements: Mutex::new(Vec::new()),
                            }),
                        )
                    })
                    .collect(),
            }
        }

        fn statements(&self, name: &str) -> Vec<String> {
            self.connectors[name].statements.lock().expect("lock").clone()
        }

        fn engine(&self, databases: &[&str]) -> Arc<FanoutEngine> {
            let targets = databases
                .iter()
                .map(|db| DatabaseTarget::new("localhost", 3306, "root", "pw", *db))
                .collect();
            let registry = Arc::new(DatabaseTargetRegistry::new(targets).expect("registry"));
            Arc::new(FanoutEngine::new(registry, self, Duration::from_secs(5)))
        }
    }

    impl ConnectorFactory for Backends {
        fn connector_for(&self, target: &DatabaseTarget) -> Arc<dyn SqlConnector> {
            self.connectors[&target.name].clone()
        }
    }

    fn rows(column: &str, values: &[&str]) -> Rows {
        values
            .iter()
            .map(|v| [(column.to_string(), json!(v))].into_iter().collect())
            .collect()
    }

    fn params(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[tokio::test]
    async fn show_tables_queries_only_the_matching_target() {
        let backends = Backends::new(vec![
            ("sales", Ok(rows("Tables_in_sales", &["orders", "customers"]))),
            ("hr", Ok(Vec::new())),
        ]);
        let tool = ListTablesTool::new(backends.engine(&["sales", "hr"]));

        let output = tool
            .call(&params(json!({ "database": "sales" })))
            .await
            .expect("should succeed");

        assert_eq!(
            output,
            ToolOutput::Json(json!({ "database": "sales", "tables": ["orders", "customers"] }))
        );
        assert_eq!(backends.statements("sales"), ["SHOW TABLES"]);
        assert!(backends.statements("hr").is_empty());
    }

    #[tokio::test]
    async fn show_tables_unknown_database_makes_no_calls() {
        let backends = Backends::new(vec![("sales", Ok(Vec::new()))]);
        let tool = ListTablesTool::new(backends.engine(&["sales"]));

        let err = tool
            .call(&params(json!({ "database": "nope" })))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ToolError::UnknownTarget {
                database: "nope".to_string()
            }
        );
        assert!(backends.statements("sales").is_empty());
    }

    #[tokio::test]
    async fn show_tables_backend_error_is_query_failed() {
        let backends = Backends::new(vec![(
            "sales",
            Err(ConnectorError::QueryFailed {
                message: "Access denied".to_string(),
                trace: Some("SQLSTATE 42000".to_string()),
            }),
        )]);
        let tool = ListTablesTool::new(backends.engine(&["sales"]));

        let err = tool
            .call(&params(json!({ "database": "sales" })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "QueryFailed");
        assert_eq!(err.trace(), Some("SQLSTATE 42000"));
    }

    #[tokio::test]
    async fn create_table_targets_first_database_in_column_order() {
        let backends = Backends::new(vec![("main", Ok(Vec::new())), ("other", Ok(Vec::new()))]);
        let tool = CreateTableTool::new(backends.engine(&["main", "other"]), &ToolsConfig::default());

        let output = tool
            .call(&params(json!({
                "table_name": "users",
                "columns": { "id": "INT", "name": "VARCHAR(255)" }
            })))
            .await
            .expect("should succeed");

        assert_eq!(output, ToolOutput::Text("Table users created".to_string()));
        assert_eq!(
            backends.statements("main"),
            ["CREATE TABLE users (id INT, name VARCHAR(255))"]
        );
        assert!(backends.statements("other").is_empty());
    }

    #[tokio::test]
    async fn create_table_rejects_injected_name_before_sending() {
        let backends = Backends::new(vec![("main", Ok(Vec::new()))]);
        let tool = CreateTableTool::new(backends.engine(&["main"]), &ToolsConfig::default());

        let err = tool
            .call(&params(json!({
                "table_name": "users; DROP TABLE accounts",
                "columns": { "id": "INT" }
            })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "InvalidIdentifier");
        assert!(backends.statements("main").is_empty());
    }

    #[tokio::test]
    async fn create_table_without_validation_passes_names_through() {
        let backends = Backends::new(vec![("main", Ok(Vec::new()))]);
        let config = ToolsConfig {
            validate_identifiers: false,
        };
        let tool = CreateTableTool::new(backends.engine(&["main"]), &config);

        tool.call(&params(json!({
            "table_name": "odd name",
            "columns": { "a": "INT" }
        })))
        .await
        .expect("sent to backend");

        assert_eq!(backends.statements("main"), ["CREATE TABLE odd name (a INT)"]);
    }

    #[tokio::test]
    async fn create_table_backend_error_is_query_failed() {
        let backends = Backends::new(vec![(
            "main",
            Err(ConnectorError::QueryFailed {
                message: "Table 'users' already exists".to_string(),
                trace: Some("SQLSTATE 42S01".to_string()),
            }),
        )]);
        let tool = CreateTableTool::new(backends.engine(&["main"]), &ToolsConfig::default());

        let err = tool
            .call(&params(json!({ "table_name": "users", "columns": { "id": "INT" } })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "QueryFailed");
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn create_table_with_no_targets_is_unknown_target() {
        let backends = Backends::new(Vec::new());
        let tool = CreateTableTool::new(backends.engine(&[]), &ToolsConfig::default());

        let err = tool
            .call(&params(json!({ "table_name": "t", "columns": { "id": "INT" } })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "UnknownTarget");
    }

    #[tokio::test]
    async fn execute_query_keys_every_target() {
        let backends = Backends::new(vec![
            ("a", Ok(rows("n", &["1"]))),
            (
                "b",
                Err(ConnectorError::ConnectionFailed {
                    reason: "refused".to_string(),
                }),
            ),
        ]);
        let tool = ExecuteQueryTool::new(backends.engine(&["a", "b"]));

        let output = tool
            .call(&params(json!({ "sql": "SELECT 1 AS n" })))
            .await
            .expect("broadcast never fails as a whole");

        let ToolOutput::Json(value) = output else {
            panic!("expected json");
        };
        assert_eq!(value["a"], json!([{ "n": "1" }]));
        assert_eq!(value["b"]["error"], "connection failed: refused");
        assert_eq!(backends.statements("a"), ["SELECT 1 AS n"]);
        assert_eq!(backends.statements("b"), ["SELECT 1 AS n"]);
    }
}
