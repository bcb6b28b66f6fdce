//! Intelligent scheduling entry point

use super::core::ExecutionOrchestrator;
use super::execution::merge_steps;
use super::recommendations::build_recommendations;
use super::types::{PlanningSummary, SchedulingOutcome};
use super::Result;
use crate::planner::PlanningStrategy;
use crate::step::TaskType;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

impl ExecutionOrchestrator {
    /// Plan, route, merge, order and execute a scheduling task
    ///
    /// Planning and routing errors are returned as `Err`. Step failures are
    /// reported inside the outcome with the partial results produced.
    #[instrument(skip(self, request_data, user_preferences), fields(task_type = %task_type))]
    pub async fn execute_intelligent_scheduling(
        &self,
        task_type: TaskType,
        request_data: &Value,
        user_id: &str,
        user_preferences: Option<&Value>,
        planning_strategy: Option<PlanningStrategy>,
    ) -> Result<SchedulingOutcome> {
        let strategy = planning_strategy.unwrap_or(self.config.default_strategy);
        let preferences = user_preferences.cloned().unwrap_or_else(|| json!({}));

        let scenario = self
            .planner
            .create_planning_scenario(task_type, request_data, &preferences);
        let planning = self.planner.plan_complex_scenario(&scenario, strategy)?;

        let (context_id, router_steps) = self
            .router
            .plan_execution(task_type, request_data, user_id, None)?;

        let merged = merge_steps(&[planning.recommended_plan.as_slice(), router_steps.as_slice()]);
        let ordered = match self
            .planner
            .optimize_execution_order(&merged, &scenario.constraints)
        {
            Ok(ordered) => ordered,
            Err(e) => {
                self.router.cleanup_context(&context_id);
                return Err(e.into());
            }
        };
        self.router.set_total_steps(&context_id, ordered.len())?;

        let execution_id = format!("exec_{}", Uuid::new_v4().simple());
        info!(
            execution_id = %execution_id,
            context_id = %context_id,
            planned = planning.recommended_plan.len(),
            routed = router_steps.len(),
            merged = ordered.len(),
            "Scheduling plan assembled"
        );

        let execution = self.run_steps(&execution_id, Some(&context_id), &ordered).await;
        let summary = PlanningSummary::from(&planning);
        let recommendations = build_recommendations(&summary, &execution, &self.config);

        Ok(SchedulingOutcome {
            execution_id,
            context_id,
            task_type,
            planning: summary,
            execution,
            recommendations,
        })
    }
}
