//! Orchestrator types
//!
//! Contains the outcome bundles returned by the orchestrator:
//! - `SchedulingOutcome` for intelligent scheduling runs
//! - `ExecutionOutcome` and `StepOutcome` for executed step lists
//! - `ConflictResolutionOutcome` for merged conflict resolutions
//! - `MultiStepPlan` for multi-operation optimization

use crate::planner::{OptimizationMetrics, PlanningConflictStrategy, PlanningResult, PlanningStrategy};
use crate::router::ResolutionStrategy;
use crate::step::{ExecutionStep, TaskType};
use kairos_tools::{JsonMap, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Registered, not started
    Pending,
    /// Steps are running
    Running,
    /// Every step succeeded
    Completed,
    /// At least one step failed
    Failed,
}

impl ExecutionStatus {
    /// Whether no further transitions are possible
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Result of one executed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step identifier
    pub step_id: String,
    /// Action (tool name)
    pub action: String,
    /// Whether the step succeeded
    pub success: bool,
    /// Tool output
    pub data: JsonMap,
    /// Failure reason
    pub error: Option<String>,
    /// Execution time reported by the tool layer
    pub execution_time_ms: u64,
    /// Retries used
    pub retry_count: u32,
}

impl StepOutcome {
    pub(crate) fn from_result(step: &ExecutionStep, result: ToolResult) -> Self {
        Self {
            step_id: step.step_id.clone(),
            action: step.action.clone(),
            success: result.success,
            data: result.data,
            error: result.error,
            execution_time_ms: result.execution_time_ms,
            retry_count: result.retry_count,
        }
    }

    pub(crate) fn from_error(step: &ExecutionStep, error: String) -> Self {
        Self {
            step_id: step.step_id.clone(),
            action: step.action.clone(),
            success: false,
            data: JsonMap::new(),
            error: Some(error),
            execution_time_ms: 0,
            retry_count: 0,
        }
    }
}

/// Outcome of executing a step list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Execution identifier
    pub execution_id: String,
    /// Terminal status
    pub status: ExecutionStatus,
    /// Results produced, in execution order
    pub step_results: Vec<StepOutcome>,
    /// Steps that succeeded
    pub completed_steps: usize,
    /// Steps planned
    pub total_steps: usize,
    /// Sum of step execution times
    pub total_execution_time_ms: u64,
    /// Errors collected during the run
    pub errors: Vec<String>,
}

impl ExecutionOutcome {
    /// Whether the run completed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }
}

/// Planning metadata attached to an outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningSummary {
    /// Scenario planned
    pub scenario_id: String,
    /// Strategy used
    pub strategy: PlanningStrategy,
    /// Plan confidence
    pub confidence_score: f64,
    /// Success-rate estimate
    pub estimated_success_rate: f64,
    /// Risk flags
    pub risk_factors: Vec<String>,
    /// Metrics of the recommended plan
    pub optimization_metrics: OptimizationMetrics,
    /// Number of alternative plans
    pub alternative_plans: usize,
}

impl From<&PlanningResult> for PlanningSummary {
    fn from(result: &PlanningResult) -> Self {
        Self {
            scenario_id: result.scenario_id.clone(),
            strategy: result.strategy,
            confidence_score: result.confidence_score,
            estimated_success_rate: result.estimated_success_rate,
            risk_factors: result.risk_factors.clone(),
            optimization_metrics: result.optimization_metrics.clone(),
            alternative_plans: result.alternative_plans.len(),
        }
    }
}

/// Recommendation urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    /// Informational
    Low,
    /// Worth acting on
    Medium,
    /// Act before relying on the result
    High,
}

/// Human-readable suggestion derived from a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Kind of recommendation, e.g. `risk_mitigation`
    pub category: String,
    /// Urgency
    pub priority: RecommendationPriority,
    /// Message for the user
    pub message: String,
}

/// Result bundle of [`execute_intelligent_scheduling`](super::ExecutionOrchestrator::execute_intelligent_scheduling)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingOutcome {
    /// Execution identifier
    pub execution_id: String,
    /// Router context identifier
    pub context_id: String,
    /// Task executed
    pub task_type: TaskType,
    /// Planning metadata
    pub planning: PlanningSummary,
    /// Execution result
    pub execution: ExecutionOutcome,
    /// Suggestions for the user
    pub recommendations: Vec<Recommendation>,
}

/// Result of [`handle_complex_conflicts`](super::ExecutionOrchestrator::handle_complex_conflicts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolutionOutcome {
    /// Router context
    pub context_id: String,
    /// Strategy chosen by the router
    pub router_strategy: ResolutionStrategy,
    /// Strategy chosen by the planner
    pub planner_strategy: PlanningConflictStrategy,
    /// Router explanation
    pub explanation: String,
    /// Conflicts resolved (all of them when the run completed)
    pub conflicts_resolved: usize,
    /// Resolution steps executed
    pub steps_executed: usize,
    /// Execution result
    pub execution: ExecutionOutcome,
}

/// One operation of a multi-step request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Task to perform
    pub task_type: TaskType,
    /// Request payload
    #[serde(default)]
    pub request_data: Value,
}

impl OperationRequest {
    /// Create an operation
    #[must_use]
    pub fn new(task_type: TaskType, request_data: Value) -> Self {
        Self {
            task_type,
            request_data,
        }
    }
}

/// Result of [`optimize_multi_step_operation`](super::ExecutionOrchestrator::optimize_multi_step_operation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiStepPlan {
    /// Integrated scenario
    pub scenario_id: String,
    /// One router context per operation, in operation order
    pub context_ids: Vec<String>,
    /// Planning metadata of the integrated scenario
    pub planning: PlanningSummary,
    /// Flattened steps, highest priority first
    pub steps: Vec<ExecutionStep>,
    /// Sum of step estimates
    pub estimated_total_ms: u64,
}
