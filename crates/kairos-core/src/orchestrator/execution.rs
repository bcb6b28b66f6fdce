//! In-order step execution with progress tracking

use super::core::ExecutionOrchestrator;
use super::types::{ExecutionOutcome, ExecutionStatus, StepOutcome};
use crate::step::ExecutionStep;
use tracing::{debug, error, info, warn};

impl ExecutionOrchestrator {
    /// Run `steps` strictly in order under `execution_id`
    ///
    /// Every step result is pushed into the router context when one is
    /// given. A failed step marks the run failed; unless
    /// `continue_on_step_failure` is set the loop stops there and the
    /// results produced so far are returned.
    pub(crate) async fn run_steps(
        &self,
        execution_id: &str,
        context_id: Option<&str>,
        steps: &[ExecutionStep],
    ) -> ExecutionOutcome {
        self.tracker.register(execution_id, context_id, steps.len());
        let base_step = context_id
            .and_then(|id| self.router.get_context(id))
            .map_or(0, |context| context.current_step);

        info!(execution_id = %execution_id, steps = steps.len(), "Execution started");

        let mut step_results = Vec::with_capacity(steps.len());
        let mut errors = Vec::new();
        let mut total_execution_time_ms = 0;
        let mut failed = false;

        for (index, step) in steps.iter().enumerate() {
            self.tracker.step_started(execution_id, &step.step_id);
            debug!(execution_id = %execution_id, step_id = %step.step_id, action = %step.action, "Executing step");

            let outcome = self.execute_step(step).await;
            total_execution_time_ms += outcome.execution_time_ms;

            let step_error = (!outcome.success).then(|| {
                format!(
                    "step '{}' failed: {}",
                    step.step_id,
                    outcome.error.as_deref().unwrap_or("unknown error")
                )
            });

            if let Some(context_id) = context_id {
                let value = serde_json::to_value(&outcome).unwrap_or_default();
                if let Err(e) = self.router.update_context(context_id, value, base_step + index + 1) {
                    warn!(execution_id = %execution_id, error = %e, "Could not record step result");
                    errors.push(e.to_string());
                    failed = true;
                }
            }

            self.tracker.step_finished(execution_id, step_error.clone());
            step_results.push(outcome);

            if let Some(message) = step_error {
                error!(execution_id = %execution_id, step_id = %step.step_id, error = %message, "Step failed");
                errors.push(message);
                failed = true;
                if !self.config.continue_on_step_failure {
                    break;
                }
            } else if failed && !self.config.continue_on_step_failure {
                break;
            }
        }

        let status = if failed {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Completed
        };
        self.tracker.finish(execution_id, status);

        let completed_steps = step_results.iter().filter(|r| r.success).count();
        info!(
            execution_id = %execution_id,
            status = ?status,
            completed = completed_steps,
            total = steps.len(),
            "Execution finished"
        );

        ExecutionOutcome {
            execution_id: execution_id.to_string(),
            status,
            step_results,
            completed_steps,
            total_steps: steps.len(),
            total_execution_time_ms,
            errors,
        }
    }

    async fn execute_step(&self, step: &ExecutionStep) -> StepOutcome {
        match self.executor.execute(step).await {
            Ok(result) => StepOutcome::from_result(step, result),
            Err(e) => StepOutcome::from_error(step, e.to_string()),
        }
    }
}

/// Union of step lists, first occurrence of each `(step_id, action)` wins
pub(crate) fn merge_steps(lists: &[&[ExecutionStep]]) -> Vec<ExecutionStep> {
    let mut merged: Vec<ExecutionStep> = Vec::new();
    for step in lists.iter().flat_map(|list| list.iter()) {
        if !merged.iter().any(|s| s.identity() == step.identity()) {
            merged.push(step.clone());
        }
    }
    merged
}
