//! MySQL connector backed by a lazily connected sqlx pool.

use crate::connector::{ConnectorFactory, Row, Rows, SqlConnector};
use crate::error::ConnectorError;
use crate::target::DatabaseTarget;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::types::chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A connector for one MySQL-compatible server.
pub struct MySqlConnector {
    target_name: String,
    pool: MySqlPool,
}

impl MySqlConnector {
    /// Creates a connector; no connection is opened until the first call.
    #[must_use]
    pub fn new(target: &DatabaseTarget, max_connections: u32, acquire_timeout: Duration) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .username(&target.user)
            .password(&target.password)
            .database(&target.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy_with(options);

        Self {
            target_name: target.name.clone(),
            pool,
        }
    }
}

#[async_trait]
impl SqlConnector for MySqlConnector {
    async fn query(&self, sql: &str) -> Result<Rows, ConnectorError> {
        debug!(target_name = %self.target_name, "running query");
        let rows = sqlx::raw_sql(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn execute(&self, sql: &str) -> Result<u64, ConnectorError> {
        debug!(target_name = %self.target_name, "running statement");
        let result = sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

/// Builds [`MySqlConnector`]s with shared pool settings.
#[derive(Debug, Clone)]
pub struct MySqlConnectorFactory {
    max_connections: u32,
    acquire_timeout: Duration,
}

impl MySqlConnectorFactory {
    /// Creates a factory.
    #[must_use]
    pub fn new(max_connections: u32, acquire_timeout: Duration) -> Self {
        Self {
            max_connections,
            acquire_timeout,
        }
    }
}

impl ConnectorFactory for MySqlConnectorFactory {
    fn connector_for(&self, target: &DatabaseTarget) -> Arc<dyn SqlConnector> {
        Arc::new(MySqlConnector::new(
            target,
            self.max_connections,
            self.acquire_timeout,
        ))
    }
}

fn map_sqlx_error(err: sqlx::Error) -> ConnectorError {
    if let sqlx::Error::Database(ref db) = err {
        return ConnectorError::QueryFailed {
            message: db.message().to_string(),
            trace: db.code().map(|code| format!("SQLSTATE {code}")),
        };
    }
    if matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
    ) {
        return ConnectorError::ConnectionFailed {
            reason: err.to_string(),
        };
    }
    ConnectorError::QueryFailed {
        message: err.to_string(),
        trace: None,
    }
}

fn row_to_json(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let value = decode_cell(row, column.ordinal(), column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

/// Decodes one cell into JSON, picking the representation from the
/// column's declared type. Anything unrecognized is returned as text.
fn decode_cell(row: &MySqlRow, index: usize, type_name: &str) -> JsonValue {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return JsonValue::Null,
    }

    let decoded = match type_name {
        "BOOLEAN" => row.try_get_unchecked::<bool, _>(index).map(JsonValue::from),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get_unchecked::<i64, _>(index).map(JsonValue::from)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "YEAR" => row.try_get_unchecked::<u64, _>(index).map(JsonValue::from),
        "FLOAT" | "DOUBLE" => row.try_get_unchecked::<f64, _>(index).map(JsonValue::from),
        "DATE" => row
            .try_get_unchecked::<NaiveDate, _>(index)
            .map(|d| JsonValue::from(d.to_string())),
        "DATETIME" | "TIMESTAMP" => row
            .try_get_unchecked::<NaiveDateTime, _>(index)
            .map(|dt| JsonValue::from(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        _ => row.try_get_unchecked::<String, _>(index).map(JsonValue::from),
    };

    decoded.unwrap_or_else(|_| {
        row.try_get_unchecked::<Vec<u8>, _>(index)
            .map(|bytes| JsonValue::from(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or(JsonValue::Null)
    })
}
