//! Run tracking
//!
//! Records move `pending -> running -> completed | failed` and are only
//! removed by cleanup or, once terminal, by eviction when tracking is full.

use super::types::ExecutionStatus;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mutable status of one execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Execution identifier
    pub execution_id: String,
    /// Router context the run was built from
    pub context_id: Option<String>,
    /// Current status
    pub status: ExecutionStatus,
    /// Steps planned
    pub total_steps: usize,
    /// Steps that succeeded
    pub completed_steps: usize,
    /// Steps that failed
    pub failed_steps: usize,
    /// Step currently running
    pub current_step: Option<String>,
    /// Errors collected
    pub errors: Vec<String>,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Last change
    pub updated_at: DateTime<Utc>,
    /// Time the record became terminal
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExecutionRecord {
    fn new(execution_id: String, context_id: Option<String>, total_steps: usize) -> Self {
        let now = Utc::now();
        Self {
            execution_id,
            context_id,
            status: ExecutionStatus::Pending,
            total_steps,
            completed_steps: 0,
            failed_steps: 0,
            current_step: None,
            errors: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Bounded map of execution records
pub(crate) struct ExecutionTracker {
    records: DashMap<String, ExecutionRecord>,
    capacity: usize,
}

impl ExecutionTracker {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            records: DashMap::new(),
            capacity,
        }
    }

    /// Register a pending record, evicting old terminal records if full
    pub(crate) fn register(&self, execution_id: &str, context_id: Option<&str>, total_steps: usize) {
        self.evict_terminal();
        self.records.insert(
            execution_id.to_string(),
            ExecutionRecord::new(execution_id.to_string(), context_id.map(str::to_string), total_steps),
        );
    }

    /// Apply `f` unless the record is already terminal
    fn update(&self, execution_id: &str, f: impl FnOnce(&mut ExecutionRecord)) {
        if let Some(mut record) = self.records.get_mut(execution_id) {
            if record.status.is_terminal() {
                return;
            }
            f(&mut record);
            record.updated_at = Utc::now();
        }
    }

    pub(crate) fn step_started(&self, execution_id: &str, step_id: &str) {
        self.update(execution_id, |record| {
            record.status = ExecutionStatus::Running;
            record.current_step = Some(step_id.to_string());
        });
    }

    pub(crate) fn step_finished(&self, execution_id: &str, error: Option<String>) {
        self.update(execution_id, |record| match error {
            None => record.completed_steps += 1,
            Some(error) => {
                record.failed_steps += 1;
                record.errors.push(error);
            }
        });
    }

    pub(crate) fn finish(&self, execution_id: &str, status: ExecutionStatus) {
        self.update(execution_id, |record| {
            record.status = status;
            record.current_step = None;
            record.completed_at = Some(Utc::now());
        });
    }

    pub(crate) fn get(&self, execution_id: &str) -> Option<ExecutionRecord> {
        self.records.get(execution_id).map(|r| r.value().clone())
    }

    pub(crate) fn remove(&self, execution_id: &str) -> Option<ExecutionRecord> {
        self.records.remove(execution_id).map(|(_, record)| record)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    fn evict_terminal(&self) {
        while self.records.len() >= self.capacity {
            let oldest = self
                .records
                .iter()
                .filter(|r| r.status.is_terminal())
                .min_by_key(|r| r.completed_at.unwrap_or(r.updated_at))
                .map(|r| r.key().clone());

            match oldest {
                Some(execution_id) => {
                    debug!(execution_id = %execution_id, "Evicting terminal execution record");
                    self.records.remove(&execution_id);
                }
                None => break,
            }
        }
    }
}
