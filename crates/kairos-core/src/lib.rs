//! Kairos Core - Scheduling Execution Engine
//!
//! This crate turns high-level scheduling tasks into ordered, dependency-aware
//! tool invocations and runs them through the tool gateway:
//! - Step: the shared `ExecutionStep` value object and task/tool enums
//! - Router: workflow construction, execution contexts, conflict strategies
//! - Planner: multi-strategy plan generation, scoring and dependency ordering
//! - Orchestrator: plan integration, run tracking and recommendations

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod conflict;
pub mod error;
pub mod orchestrator;
pub mod planner;
pub mod router;
pub mod step;

pub use config::KairosConfig;
pub use conflict::{severity_histogram, AlternativeSlot, Conflict, ConflictSeverity};
pub use error::{Error, Result};
pub use orchestrator::{
    ConflictResolutionOutcome, ExecutionOrchestrator, ExecutionOutcome, ExecutionRecord,
    ExecutionStatus, GatewayStepExecutor, MultiStepPlan, OperationRequest, OrchestratorConfig,
    OrchestratorError, PlanningSummary, Recommendation, RecommendationPriority, SchedulingOutcome,
    SimulatedStepExecutor, StepExecutor, StepOutcome,
};
pub use planner::{
    PlannerConfig, PlannerError, PlanningConflictResolution, PlanningConstraint, PlanningResult,
    PlanningScenario, PlanningStrategy, ScenarioPlanner,
};
pub use router::{
    ComplexityAnalysis, ComplexityLevel, ConflictAnalysis, ConflictResolution,
    ConflictResolutionRecord, ContextSummary, ExecutionContext, ResolutionStrategy, RouterConfig,
    RouterError, TaskRouter,
};
pub use step::{ExecutionStep, StepPriority, TaskType, ToolType};
