//! Error types for the database crate.
//!
//! - `ConnectorError`: one backend call against one target
//! - `RegistryError`: loading the target list
//! - `DdlError`: building a statement from caller-supplied identifiers

use std::fmt;

/// Errors from a single backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// Could not reach or authenticate against the target.
    ConnectionFailed { reason: String },
    /// The backend rejected or failed the statement.
    QueryFailed {
        message: String,
        /// Backend-specific detail, such as the server error code.
        trace: Option<String>,
    },
    /// The call did not finish in time.
    Timeout { after_secs: u64 },
}

impl ConnectorError {
    /// Backend-specific detail, when there is any.
    #[must_use]
    pub fn trace(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { trace, .. } => trace.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { reason } => {
                write!(f, "connection failed: {reason}")
            }
            Self::QueryFailed { message, .. } => {
                write!(f, "query failed: {message}")
            }
            Self::Timeout { after_secs } => {
                write!(f, "query timed out after {after_secs}s")
            }
        }
    }
}

impl std::error::Error for ConnectorError {}

/// Errors from loading database targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two targets share a logical name.
    DuplicateTarget { name: String },
    /// A target is missing a required field.
    InvalidTarget { name: String, reason: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTarget { name } => {
                write!(f, "duplicate database target: {name}")
            }
            Self::InvalidTarget { name, reason } => {
                write!(f, "invalid database target '{name}': {reason}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors from building DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlError {
    /// A table or column name is not a plain identifier.
    InvalidIdentifier { kind: &'static str, value: String },
    /// A column type contains statement separators or comments.
    InvalidColumnType { column: String, value: String },
    /// No columns were given.
    NoColumns,
}

impl fmt::Display for DdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdentifier { kind, value } => {
                write!(f, "invalid {kind} name: '{value}'")
            }
            Self::InvalidColumnType { column, value } => {
                write!(f, "invalid type for column '{column}': '{value}'")
            }
            Self::NoColumns => write!(f, "a table needs at least one column"),
        }
    }
}

impl std::error::Error for DdlError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_error_display() {
        let err = ConnectorError::ConnectionFailed {
            reason: "host unreachable".to_string(),
        };
        assert!(err.to_string().contains("connection failed"));
        assert!(err.to_string().contains("host unreachable"));
    }

    #[test]
    fn query_failed_exposes_trace() {
        let err = ConnectorError::QueryFailed {
            message: "table missing".to_string(),
            trace: Some("1146 (42S02)".to_string()),
        };
        assert_eq!(err.trace(), Some("1146 (42S02)"));
        assert!(!err.to_string().contains("42S02"));
    }

    #[test]
    fn registry_error_display() {
        let err = RegistryError::DuplicateTarget {
            name: "sales".to_string(),
        };
        assert!(err.to_string().contains("sales"));
    }

    #[test]
    fn ddl_error_display() {
        let err = DdlError::InvalidIdentifier {
            kind: "table",
            value: "a;b".to_string(),
        };
        assert_eq!(err.to_string(), "invalid table name: 'a;b'");
    }
}
