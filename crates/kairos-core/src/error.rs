//! Error types for kairos-core
//!
//! Each component has its own error enum; [`Error`] wraps all of them for
//! callers that drive more than one component.

use thiserror::Error;

pub use crate::orchestrator::OrchestratorError;
pub use crate::planner::PlannerError;
pub use crate::router::RouterError;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Task routing failed
    #[error("router error: {0}")]
    Router(#[from] RouterError),

    /// Scenario planning failed
    #[error("planner error: {0}")]
    Planner(#[from] PlannerError),

    /// Orchestration failed
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    /// Tool gateway error
    #[error("tool error: {0}")]
    Tool(#[from] kairos_tools::Error),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: Error = RouterError::ContextNotFound("ctx_1".to_string()).into();
        assert_eq!(err.to_string(), "router error: execution context not found: ctx_1");

        let err: Error = kairos_tools::Error::NotFound("create_event".to_string()).into();
        assert!(matches!(err, Error::Tool(_)));
    }
}
