//! Database access for Ploughman.
//!
//! This crate provides:
//!
//! - **Targets**: the fixed, configured list of database backends
//! - **Connector trait**: text SQL against one target, with a MySQL backend
//! - **Fan-out engine**: one statement against every target at once
//! - **DDL builder**: `CREATE TABLE` with identifier validation

pub mod connector;
pub mod ddl;
pub mod error;
pub mod fanout;
pub mod mysql;
pub mod target;

pub use connector::{ConnectorFactory, Row, Rows, SqlConnector, first_column_strings};
pub use ddl::{create_table_statement, validate_column_type, validate_identifier};
pub use error::{ConnectorError, DdlError, RegistryError};
pub use fanout::{FanoutConfig, FanoutEngine, FanoutResult, TargetFailure, TargetOutcome};
pub use mysql::{MySqlConnector, MySqlConnectorFactory};
pub use target::{DatabaseTarget, DatabaseTargetConfig, DatabaseTargetRegistry};
