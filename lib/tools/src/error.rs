//! Tool error types.

use std::fmt;

/// Errors returned by a tool invocation.
///
/// These are values: the orchestrator turns them into response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No tool is registered under this name.
    NotFound { name: String },
    /// The parameters do not fit the tool's schema.
    InvalidInput { tool: String, reason: String },
    /// The completion or rendering backend failed or timed out.
    UpstreamUnavailable { service: String, reason: String },
    /// No database target matches.
    UnknownTarget { database: String },
    /// A database rejected or failed the statement.
    QueryFailed {
        target: String,
        message: String,
        trace: Option<String>,
    },
    /// A table or column name failed validation.
    InvalidIdentifier { reason: String },
}

impl ToolError {
    /// Short, stable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::InvalidInput { .. } => "InvalidInput",
            Self::UpstreamUnavailable { .. } => "UpstreamUnavailable",
            Self::UnknownTarget { .. } => "UnknownTarget",
            Self::QueryFailed { .. } => "QueryFailed",
            Self::InvalidIdentifier { .. } => "InvalidIdentifier",
        }
    }

    /// Backend detail, when there is any.
    #[must_use]
    pub fn trace(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { trace, .. } => trace.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn invalid_input(tool: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "tool not found: {name}"),
            Self::InvalidInput { tool, reason } => {
                write!(f, "invalid input for {tool}: {reason}")
            }
            Self::UpstreamUnavailable { service, reason } => {
                write!(f, "{service} unavailable: {reason}")
            }
            Self::UnknownTarget { database } => {
                write!(f, "no database target configured for '{database}'")
            }
            Self::QueryFailed {
                target, message, ..
            } => write!(f, "query failed on {target}: {message}"),
            Self::InvalidIdentifier { reason } => write!(f, "invalid identifier: {reason}"),
        }
    }
}

impl std::error::Error for ToolError {}

/// Errors from chart rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The selected column holds nothing plottable.
    NothingToPlot { column: String },
    /// Image encoding failed.
    EncodeFailed { reason: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToPlot { column } => {
                write!(f, "nothing to plot in column '{column}'")
            }
            Self::EncodeFailed { reason } => write!(f, "image encoding failed: {reason}"),
        }
    }
}

impl std::error::Error for RenderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        let err = ToolError::UnknownTarget {
            database: "sales".to_string(),
        };
        assert_eq!(err.kind(), "UnknownTarget");
        assert_eq!(
            err.to_string(),
            "no database target configured for 'sales'"
        );
    }

    #[test]
    fn query_failed_carries_trace() {
        let err = ToolError::QueryFailed {
            target: "sales".to_string(),
            message: "Table 'x' doesn't exist".to_string(),
            trace: Some("SQLSTATE 42S02".to_string()),
        };
        assert_eq!(err.trace(), Some("SQLSTATE 42S02"));
        assert!(err.to_string().starts_with("query failed on sales"));
    }

    #[test]
    fn render_error_display() {
        let err = RenderError::NothingToPlot {
            column: "name".to_string(),
        };
        assert!(err.to_string().contains("'name'"));
    }
}
