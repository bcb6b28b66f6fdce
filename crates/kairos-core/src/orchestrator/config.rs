//! Orchestrator configuration

use crate::planner::PlanningStrategy;
use serde::{Deserialize, Serialize};

/// Configuration for the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Keep executing after a failed step (the run still ends failed)
    pub continue_on_step_failure: bool,
    /// Execution records kept before terminal ones are evicted
    pub max_tracked_executions: usize,
    /// Strategy used when the caller does not pick one
    pub default_strategy: PlanningStrategy,
    /// Confidence below which a constraint review is recommended
    pub low_confidence_threshold: f64,
    /// Total execution time above which optimization is recommended
    pub slow_execution_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            continue_on_step_failure: false,
            max_tracked_executions: 1000,
            default_strategy: PlanningStrategy::Balanced,
            low_confidence_threshold: 0.7,
            slow_execution_ms: 10_000,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue past failed steps
    #[must_use]
    pub fn with_continue_on_step_failure(mut self, enabled: bool) -> Self {
        self.continue_on_step_failure = enabled;
        self
    }

    /// Set the tracking bound
    #[must_use]
    pub fn with_max_tracked_executions(mut self, max: usize) -> Self {
        self.max_tracked_executions = max;
        self
    }

    /// Set the default planning strategy
    #[must_use]
    pub fn with_default_strategy(mut self, strategy: PlanningStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }
}
