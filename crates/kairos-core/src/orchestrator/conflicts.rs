//! Merged planner and router conflict resolution

use super::core::ExecutionOrchestrator;
use super::execution::merge_steps;
use super::types::ConflictResolutionOutcome;
use super::{OrchestratorError, Result};
use crate::conflict::{AlternativeSlot, Conflict};
use crate::step::ExecutionStep;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

impl ExecutionOrchestrator {
    /// Resolve conflicts on an active run
    ///
    /// The planner's impact analysis and the router's strategy each produce
    /// steps; they are merged, grouped, ordered by dependencies and executed
    /// against the context. A dependency cycle is returned as `Err`.
    #[instrument(skip(self, conflicts, alternatives), fields(conflicts = conflicts.len()))]
    pub async fn handle_complex_conflicts(
        &self,
        context_id: &str,
        conflicts: &[Conflict],
        alternatives: &[AlternativeSlot],
    ) -> Result<ConflictResolutionOutcome> {
        let context = self
            .router
            .get_context(context_id)
            .ok_or_else(|| OrchestratorError::ContextNotFound(context_id.to_string()))?;

        let scenario = self.planner.create_planning_scenario(
            context.task_type,
            &context.original_request,
            &json!({}),
        );
        let planner_resolution = self.planner.handle_planning_conflicts(&scenario, conflicts);
        let router_resolution = self.router.handle_conflicts(context_id, conflicts, alternatives)?;

        let grouped = interleave_resolution_steps(&planner_resolution.steps, &router_resolution.steps);
        let steps = self.planner.optimize_execution_order(&grouped, &scenario.constraints)?;
        self.router
            .set_total_steps(context_id, context.current_step + steps.len())?;

        let execution_id = format!("exec_{}", Uuid::new_v4().simple());
        info!(
            execution_id = %execution_id,
            planner_strategy = %planner_resolution.strategy,
            router_strategy = %router_resolution.strategy,
            steps = steps.len(),
            "Conflict resolution assembled"
        );

        let execution = self.run_steps(&execution_id, Some(context_id), &steps).await;
        let conflicts_resolved = if execution.is_success() { conflicts.len() } else { 0 };

        Ok(ConflictResolutionOutcome {
            context_id: context_id.to_string(),
            router_strategy: router_resolution.strategy,
            planner_strategy: planner_resolution.strategy,
            explanation: router_resolution.explanation,
            conflicts_resolved,
            steps_executed: execution.step_results.len(),
            execution,
        })
    }
}

/// Planner `analyze*` steps, then `execute*`/`update*` steps, then the rest
///
/// Relative order is kept inside each group. The grouping is only a
/// preference: callers still order the result by dependencies.
pub(crate) fn interleave_resolution_steps(
    planner_steps: &[ExecutionStep],
    router_steps: &[ExecutionStep],
) -> Vec<ExecutionStep> {
    let is_planner_analysis = |step: &ExecutionStep| {
        step.action.starts_with("analyze")
            && planner_steps.iter().any(|p| p.identity() == step.identity())
    };
    let (analyze, rest): (Vec<_>, Vec<_>) = merge_steps(&[planner_steps, router_steps])
        .into_iter()
        .partition(|s| is_planner_analysis(s));
    let (act, rest): (Vec<_>, Vec<_>) = rest
        .into_iter()
        .partition(|s| s.action.starts_with("execute") || s.action.starts_with("update"));
    analyze.into_iter().chain(act).chain(rest).collect()
}
