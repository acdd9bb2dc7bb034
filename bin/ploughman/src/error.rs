//! Startup errors for the console binary.

use std::fmt;

/// Reasons the binary could not start or keep running.
#[derive(Debug)]
pub enum AppError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// The database targets were rejected.
    Registry { reason: String },
    /// The completion backend could not be built.
    Backend { reason: String },
    /// Reading input or writing output failed.
    Io { reason: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "failed to load configuration: {}", reason),
            Self::Registry { reason } => write!(f, "invalid database targets: {}", reason),
            Self::Backend { reason } => {
                write!(f, "failed to create completion backend: {}", reason)
            }
            Self::Io { reason } => write!(f, "console I/O failed: {}", reason),
        }
    }
}

impl std::error::Error for AppError {}
