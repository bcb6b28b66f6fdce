//! Orchestrator core structure
//!
//! Contains the `ExecutionOrchestrator` struct, its constructors and the
//! run-tracking accessors.

use super::config::OrchestratorConfig;
use super::executor::{GatewayStepExecutor, StepExecutor};
use super::tracking::{ExecutionRecord, ExecutionTracker};
use crate::config::KairosConfig;
use crate::planner::ScenarioPlanner;
use crate::router::TaskRouter;
use kairos_tools::ToolGateway;
use std::sync::Arc;
use tracing::info;

/// Coordinates planner, router and step execution
pub struct ExecutionOrchestrator {
    pub(crate) router: Arc<TaskRouter>,
    pub(crate) planner: Arc<ScenarioPlanner>,
    pub(crate) executor: Arc<dyn StepExecutor>,
    pub(crate) tracker: ExecutionTracker,
    pub(crate) config: OrchestratorConfig,
}

impl ExecutionOrchestrator {
    /// Create an orchestrator from its collaborators
    #[must_use]
    pub fn new(
        router: Arc<TaskRouter>,
        planner: Arc<ScenarioPlanner>,
        executor: Arc<dyn StepExecutor>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            router,
            planner,
            executor,
            tracker: ExecutionTracker::new(config.max_tracked_executions),
            config,
        }
    }

    /// Build every component from one configuration, executing steps on `gateway`
    #[must_use]
    pub fn from_config(config: &KairosConfig, gateway: Arc<ToolGateway>) -> Self {
        Self::new(
            Arc::new(TaskRouter::new(config.router.clone())),
            Arc::new(ScenarioPlanner::new(config.planner.clone())),
            Arc::new(GatewayStepExecutor::new(gateway)),
            config.orchestrator.clone(),
        )
    }

    /// Replace the step executor
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn StepExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Get the router
    #[must_use]
    pub fn router(&self) -> &Arc<TaskRouter> {
        &self.router
    }

    /// Get the planner
    #[must_use]
    pub fn planner(&self) -> &Arc<ScenarioPlanner> {
        &self.planner
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Snapshot of a tracked execution
    #[must_use]
    pub fn get_execution_status(&self, execution_id: &str) -> Option<ExecutionRecord> {
        self.tracker.get(execution_id)
    }

    /// Number of tracked executions
    #[must_use]
    pub fn tracked_executions(&self) -> usize {
        self.tracker.len()
    }

    /// Remove an execution record and the router context it was built from
    pub fn cleanup_execution(&self, execution_id: &str) -> Option<ExecutionRecord> {
        let record = self.tracker.remove(execution_id)?;
        if let Some(context_id) = &record.context_id {
            self.router.cleanup_context(context_id);
        }
        info!(execution_id = %execution_id, status = ?record.status, "Execution cleaned up");
        Some(record)
    }
}
