//! Task Router - Workflow construction and conflict strategies
//!
//! The router turns a task type and request payload into an ordered step
//! list and registers an [`ExecutionContext`] for the run. It also selects a
//! resolution strategy for detected conflicts and records the decision on the
//! context.
//!
//! # Module Structure
//!
//! - `complexity`: request complexity scoring
//! - `workflows`: per-task step builders
//! - `conflicts`: conflict analysis and strategy rules
//! - `context`: execution contexts and history records

mod complexity;
mod conflicts;
mod context;
mod workflows;


pub use complexity::{analyze_complexity, ComplexityAnalysis, ComplexityLevel};
pub use conflicts::{
    analyze_conflicts, explain, resolution_steps, ConflictAnalysis, ConflictResolution,
    ResolutionComplexity, ResolutionStrategy,
};
pub use context::{ConflictResolutionRecord, ContextSummary, ExecutionContext};
pub use workflows::build_workflow;

use crate::conflict::{AlternativeSlot, Conflict};
use crate::step::{ExecutionStep, TaskType};
use chrono::Utc;
use conflicts::{select_strategy, StrategyThresholds};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Router errors
#[derive(Debug, Error)]
pub enum RouterError {
    /// Task type string did not name a known task
    #[error("unsupported task type: {0}")]
    UnsupportedTaskType(String),

    /// No active context under this id
    #[error("execution context not found: {0}")]
    ContextNotFound(String),

    /// Request payload is not usable
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for router operations
pub type Result<T> = std::result::Result<T, RouterError>;

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Summaries kept after contexts are cleaned up
    pub history_capacity: usize,
    /// Prior resolutions above which conflicts are escalated
    pub escalation_history_threshold: usize,
    /// Conflict count above which batch resolution is used
    pub batch_conflict_threshold: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            history_capacity: 500,
            escalation_history_threshold: 2,
            batch_conflict_threshold: 3,
        }
    }
}

impl RouterConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history capacity
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

/// Builds workflows and owns active execution contexts
pub struct TaskRouter {
    contexts: DashMap<String, ExecutionContext>,
    history: Mutex<VecDeque<ContextSummary>>,
    config: RouterConfig,
}

impl Default for TaskRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl TaskRouter {
    /// Create a router
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self {
            contexts: DashMap::new(),
            history: Mutex::new(VecDeque::new()),
            config,
        }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Build the workflow for `task_type` and register a fresh context
    pub fn plan_execution(
        &self,
        task_type: TaskType,
        request_data: &Value,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<(String, Vec<ExecutionStep>)> {
        if !request_data.is_object() {
            return Err(RouterError::InvalidRequest(
                "request payload must be a JSON object".to_string(),
            ));
        }

        let complexity = analyze_complexity(request_data);
        let steps = build_workflow(task_type, request_data, &complexity);

        let context_id = format!("ctx_{}", Uuid::new_v4().simple());
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("session_{}", Uuid::new_v4().simple()));

        debug!(
            context_id = %context_id,
            task_type = %task_type,
            score = complexity.score,
            level = %complexity.level,
            "Complexity analyzed"
        );

        let context = ExecutionContext::new(
            context_id.clone(),
            session_id,
            user_id.to_string(),
            task_type,
            request_data.clone(),
            complexity,
            steps.len(),
        );
        self.contexts.insert(context_id.clone(), context);

        info!(
            context_id = %context_id,
            task_type = %task_type,
            user_id = %user_id,
            steps = steps.len(),
            "Execution planned"
        );
        Ok((context_id, steps))
    }

    /// Select a strategy for `conflicts` and record it on the context
    pub fn handle_conflicts(
        &self,
        context_id: &str,
        conflicts: &[Conflict],
        alternatives: &[AlternativeSlot],
    ) -> Result<ConflictResolution> {
        let mut context = self
            .contexts
            .get_mut(context_id)
            .ok_or_else(|| RouterError::ContextNotFound(context_id.to_string()))?;

        let analysis = analyze_conflicts(conflicts, alternatives);
        let thresholds = StrategyThresholds {
            escalation_history: self.config.escalation_history_threshold,
            batch_conflicts: self.config.batch_conflict_threshold,
        };
        let (strategy, rationale) = select_strategy(&analysis, context.conflict_history.len(), thresholds);
        let steps = resolution_steps(strategy, conflicts, alternatives);
        let explanation = explain(strategy, &analysis);

        debug!(
            context_id = %context_id,
            strategy = %strategy,
            conflicts = analysis.total_conflicts,
            rationale = %rationale,
            "Conflict strategy selected"
        );

        context.conflict_history.push(ConflictResolutionRecord {
            strategy,
            rationale: rationale.clone(),
            explanation: explanation.clone(),
            analysis: analysis.clone(),
            conflict_ids: conflicts.iter().map(|c| c.conflict_id.clone()).collect(),
            step_ids: steps.iter().map(|s| s.step_id.clone()).collect(),
            timestamp: Utc::now(),
        });
        context.updated_at = Utc::now();

        Ok(ConflictResolution {
            context_id: context_id.to_string(),
            strategy,
            rationale,
            explanation,
            analysis,
            steps,
        })
    }

    /// Store a step result under `step_{current_step}` and advance
    pub fn update_context(&self, context_id: &str, step_result: Value, next_step_index: usize) -> Result<()> {
        let mut context = self
            .contexts
            .get_mut(context_id)
            .ok_or_else(|| RouterError::ContextNotFound(context_id.to_string()))?;
        context.record_step(step_result, next_step_index);
        Ok(())
    }

    /// Replace the planned step count once the executed list is known
    pub fn set_total_steps(&self, context_id: &str, total_steps: usize) -> Result<()> {
        let mut context = self
            .contexts
            .get_mut(context_id)
            .ok_or_else(|| RouterError::ContextNotFound(context_id.to_string()))?;
        context.total_steps = total_steps;
        context.updated_at = Utc::now();
        Ok(())
    }

    /// Snapshot of an active context
    #[must_use]
    pub fn get_context(&self, context_id: &str) -> Option<ExecutionContext> {
        self.contexts.get(context_id).map(|c| c.value().clone())
    }

    /// Remove a context and keep its summary
    pub fn cleanup_context(&self, context_id: &str) -> Option<ContextSummary> {
        let (_, context) = self.contexts.remove(context_id)?;
        let summary = context.summarize();

        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push_back(summary.clone());
        while history.len() > self.config.history_capacity {
            history.pop_front();
        }

        info!(
            context_id = %context_id,
            steps_completed = summary.steps_completed,
            conflict_resolutions = summary.conflict_resolutions,
            "Execution context cleaned up"
        );
        Some(summary)
    }

    /// Number of active contexts
    #[must_use]
    pub fn active_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Most recent summaries, newest first
    #[must_use]
    pub fn execution_history(&self, limit: usize) -> Vec<ContextSummary> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.iter().rev().take(limit).cloned().collect()
    }
}
