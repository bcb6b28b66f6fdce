//! Execution contexts and their history records

use super::complexity::ComplexityAnalysis;
use super::conflicts::{ConflictAnalysis, ResolutionStrategy};
use crate::step::TaskType;
use chrono::{DateTime, Utc};
use kairos_tools::JsonMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One in-flight task run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Context identifier
    pub context_id: String,
    /// Session the run belongs to
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// Task being executed
    pub task_type: TaskType,
    /// Request payload as received
    pub original_request: Value,
    /// Complexity computed at planning time
    pub complexity: ComplexityAnalysis,
    /// Index of the next step to run
    pub current_step: usize,
    /// Number of planned steps
    pub total_steps: usize,
    /// Step results keyed `step_{n}`
    pub accumulated_data: JsonMap,
    /// Conflict resolutions applied to this run
    pub conflict_history: Vec<ConflictResolutionRecord>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl ExecutionContext {
    pub(crate) fn new(
        context_id: String,
        session_id: String,
        user_id: String,
        task_type: TaskType,
        original_request: Value,
        complexity: ComplexityAnalysis,
        total_steps: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            context_id,
            session_id,
            user_id,
            task_type,
            original_request,
            complexity,
            current_step: 0,
            total_steps,
            accumulated_data: JsonMap::new(),
            conflict_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Store a step result and advance the cursor
    pub(crate) fn record_step(&mut self, step_result: Value, next_step_index: usize) {
        self.accumulated_data
            .insert(format!("step_{}", self.current_step), step_result);
        self.current_step = next_step_index;
        self.updated_at = Utc::now();
    }

    /// Whether every planned step has been recorded
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_step >= self.total_steps
    }

    pub(crate) fn summarize(&self) -> ContextSummary {
        ContextSummary {
            context_id: self.context_id.clone(),
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            task_type: self.task_type,
            total_steps: self.total_steps,
            steps_completed: self.current_step,
            conflict_resolutions: self.conflict_history.len(),
            created_at: self.created_at,
            completed_at: Utc::now(),
        }
    }
}

/// One applied conflict resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolutionRecord {
    /// Selected strategy
    pub strategy: ResolutionStrategy,
    /// Rule that selected the strategy
    pub rationale: String,
    /// User-facing explanation
    pub explanation: String,
    /// Analysis the decision was based on
    pub analysis: ConflictAnalysis,
    /// Conflicts covered
    pub conflict_ids: Vec<String>,
    /// Resolution step ids
    pub step_ids: Vec<String>,
    /// When the resolution was selected
    pub timestamp: DateTime<Utc>,
}

/// Record kept after a context is cleaned up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSummary {
    /// Context identifier
    pub context_id: String,
    /// Session identifier
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// Task type
    pub task_type: TaskType,
    /// Planned steps
    pub total_steps: usize,
    /// Steps recorded before cleanup
    pub steps_completed: usize,
    /// Number of conflict resolutions
    pub conflict_resolutions: usize,
    /// Context creation time
    pub created_at: DateTime<Utc>,
    /// Cleanup time
    pub completed_at: DateTime<Utc>,
}
