//! Step execution seam
//!
//! The orchestrator never calls tools directly; it hands each step to a
//! [`StepExecutor`]. Production code uses [`GatewayStepExecutor`].

use crate::step::ExecutionStep;
use async_trait::async_trait;
use kairos_tools::{JsonMap, ToolGateway, ToolResult};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Runs a single step
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Execute `step`. Tool failures are reported as a failed [`ToolResult`];
    /// `Err` is reserved for executor-level faults.
    async fn execute(&self, step: &ExecutionStep) -> kairos_tools::Result<ToolResult>;
}

/// Invokes the tool named by `step.action` on the gateway
pub struct GatewayStepExecutor {
    gateway: Arc<ToolGateway>,
}

impl GatewayStepExecutor {
    /// Create an executor over `gateway`
    #[must_use]
    pub fn new(gateway: Arc<ToolGateway>) -> Self {
        Self { gateway }
    }

    /// Get the gateway
    #[must_use]
    pub fn gateway(&self) -> &Arc<ToolGateway> {
        &self.gateway
    }
}

#[async_trait]
impl StepExecutor for GatewayStepExecutor {
    async fn execute(&self, step: &ExecutionStep) -> kairos_tools::Result<ToolResult> {
        Ok(self
            .gateway
            .invoke_tool(&step.action, step.inputs.clone(), None, None)
            .await)
    }
}

/// Always succeeds without calling any tool
///
/// Reports each step's estimate as its execution time. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedStepExecutor;

#[async_trait]
impl StepExecutor for SimulatedStepExecutor {
    async fn execute(&self, step: &ExecutionStep) -> kairos_tools::Result<ToolResult> {
        let mut data = JsonMap::new();
        data.insert("simulated".to_string(), json!(true));
        data.insert("step_id".to_string(), json!(step.step_id));
        Ok(ToolResult::success(
            &step.action,
            format!("sim_{}", Uuid::new_v4().simple()),
            data,
            step.estimated_duration_ms,
        ))
    }
}
