//! Error types for liteql.

use thiserror::Error;

/// The main error type for liteql operations.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiled statement is empty after trimming.
    #[error("Empty SQL statement")]
    EmptyStatement,

    /// An unexpected fault inside the compiler, caught at the call boundary.
    #[error("SQL compilation error: {0}")]
    Internal(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution error.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Create an internal error from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown fault".to_string()
        };
        Self::Internal(message)
    }
}

/// Result type alias for liteql operations.
pub type CompileResult<T> = Result<T, CompileError>;
