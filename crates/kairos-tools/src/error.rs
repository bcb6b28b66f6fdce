//! Error types for kairos-tools

use thiserror::Error;

/// Tool error type
#[derive(Debug, Error)]
pub enum Error {
    /// Tool not found
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Tool execution failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Registration rejected
    #[error("registration failed: {0}")]
    Registration(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Invocation was cancelled
    #[error("invocation cancelled: {0}")]
    Cancelled(String),
}

/// Alias used by callers that name the gateway's error explicitly
pub type ToolInvocationError = Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
