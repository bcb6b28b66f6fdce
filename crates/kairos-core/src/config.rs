//! Aggregated configuration
//!
//! [`KairosConfig`] groups the per-component configs so the binary can load
//! them from one layered source.

use crate::orchestrator::OrchestratorConfig;
use crate::planner::PlannerConfig;
use crate::router::RouterConfig;
use kairos_tools::GatewayConfig;
use serde::{Deserialize, Serialize};

/// Configuration for every execution-core component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KairosConfig {
    /// Tool gateway settings
    pub gateway: GatewayConfig,
    /// Task router settings
    pub router: RouterConfig,
    /// Scenario planner settings
    pub planner: PlannerConfig,
    /// Orchestrator settings
    pub orchestrator: OrchestratorConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: KairosConfig = serde_json::from_str(
            r#"{"planner": {"cache_capacity": 8}, "orchestrator": {"continue_on_step_failure": true}}"#,
        )
        .unwrap();

        assert_eq!(config.planner.cache_capacity, 8);
        assert!(!config.planner.tolerate_cycles);
        assert!(config.orchestrator.continue_on_step_failure);
        assert_eq!(config.gateway.history_capacity, 1000);
        assert_eq!(config.router.history_capacity, RouterConfig::default().history_capacity);
    }
}
