//! Multi-operation optimization

use super::core::ExecutionOrchestrator;
use super::types::{MultiStepPlan, OperationRequest, PlanningSummary};
use super::{OrchestratorError, Result};
use crate::planner::{total_duration_ms, PlanningStrategy};
use crate::step::ExecutionStep;
use serde_json::json;
use std::cmp::Reverse;
use tracing::{info, instrument};
use uuid::Uuid;

impl ExecutionOrchestrator {
    /// Plan several operations as one
    ///
    /// One router context is created per operation; its step ids (and the
    /// dependencies between them) are prefixed `op{n}_`. The flattened list
    /// is ordered by priority, highest first, then by shorter duration.
    #[instrument(skip(self, operations, optimization_goals), fields(operations = operations.len()))]
    pub fn optimize_multi_step_operation(
        &self,
        operations: &[OperationRequest],
        user_id: &str,
        optimization_goals: &[String],
    ) -> Result<MultiStepPlan> {
        if operations.is_empty() {
            return Err(OrchestratorError::InvalidOperation(
                "no operations to optimize".to_string(),
            ));
        }

        let scenarios: Vec<_> = operations
            .iter()
            .map(|op| {
                self.planner
                    .create_planning_scenario(op.task_type, &op.request_data, &json!({}))
            })
            .collect();
        let integrated = self.planner.integrate_scenarios(&scenarios, optimization_goals);
        let planning = self
            .planner
            .plan_complex_scenario(&integrated, PlanningStrategy::Optimal)?;

        let session_id = format!("multi_{}", Uuid::new_v4().simple());
        let mut context_ids: Vec<String> = Vec::with_capacity(operations.len());
        let mut steps: Vec<ExecutionStep> = Vec::new();

        for (n, op) in operations.iter().enumerate() {
            let planned = self
                .router
                .plan_execution(op.task_type, &op.request_data, user_id, Some(&session_id));
            let (context_id, op_steps) = match planned {
                Ok(planned) => planned,
                Err(e) => {
                    for context_id in &context_ids {
                        self.router.cleanup_context(context_id);
                    }
                    return Err(e.into());
                }
            };

            let prefix = format!("op{}_", n);
            steps.extend(op_steps.into_iter().map(|mut step| {
                step.step_id = format!("{}{}", prefix, step.step_id);
                for dependency in &mut step.dependencies {
                    *dependency = format!("{}{}", prefix, dependency);
                }
                step
            }));
            context_ids.push(context_id);
        }

        steps.sort_by_key(|s| (Reverse(s.priority), s.estimated_duration_ms));
        let estimated_total_ms = total_duration_ms(&steps);

        info!(
            scenario_id = %integrated.scenario_id,
            contexts = context_ids.len(),
            steps = steps.len(),
            "Multi-step operation optimized"
        );

        Ok(MultiStepPlan {
            scenario_id: integrated.scenario_id,
            context_ids,
            planning: PlanningSummary::from(&planning),
            steps,
            estimated_total_ms,
        })
    }
}
