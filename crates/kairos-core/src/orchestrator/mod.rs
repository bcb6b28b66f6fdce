//! Orchestrator - Plan integration and execution
//!
//! The orchestrator combines the planner's recommended plan with the
//! router's workflow, orders the merged steps, executes them through a
//! [`StepExecutor`] and tracks every run.
//!
//! # Module Structure
//!
//! - `types`: outcome bundles and statuses
//! - `config`: `OrchestratorConfig`
//! - `core`: `ExecutionOrchestrator` struct and accessors
//! - `executor`: the `StepExecutor` seam and its implementations
//! - `tracking`: bounded run tracking
//! - `execution`: the in-order step loop
//! - `scheduling`: intelligent scheduling entry point
//! - `conflicts`: merged conflict resolution
//! - `multi_step`: multi-operation optimization
//! - `recommendations`: recommendation rules

mod config;
mod conflicts;
mod core;
mod execution;
mod executor;
mod multi_step;
mod recommendations;
mod scheduling;
mod tracking;
mod types;

#[cfg(test)]
mod tests;

pub use config::OrchestratorConfig;
pub use self::core::ExecutionOrchestrator;
pub use executor::{GatewayStepExecutor, SimulatedStepExecutor, StepExecutor};
pub use tracking::ExecutionRecord;
pub use types::{
    ConflictResolutionOutcome, ExecutionOutcome, ExecutionStatus, MultiStepPlan, OperationRequest,
    PlanningSummary, Recommendation, RecommendationPriority, SchedulingOutcome, StepOutcome,
};

use crate::planner::PlannerError;
use crate::router::RouterError;
use thiserror::Error;

/// Orchestrator errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No router context under this id
    #[error("execution context not found: {0}")]
    ContextNotFound(String),

    /// Operation request cannot be processed
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Routing failed
    #[error(transparent)]
    Router(#[from] RouterError),

    /// Planning failed
    #[error(transparent)]
    Planner(#[from] PlannerError),
}

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;
