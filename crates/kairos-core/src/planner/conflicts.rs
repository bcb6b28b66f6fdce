//! Planning-level conflict impact analysis

use super::scenario::PlanningScenario;
use crate::conflict::{severity_histogram, Conflict, ConflictSeverity};
use crate::step::{ExecutionStep, StepPriority, ToolType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Overlap beyond which impact is high
const HIGH_IMPACT_OVERLAP_MINUTES: u64 = 240;

/// Strategy chosen by the planner for a conflict set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningConflictStrategy {
    /// Hand off to the organizer
    Escalate,
    /// Plan and verify a staged resolution
    MultiStepResolution,
    /// Reschedule all affected events together
    BatchResolution,
    /// Single reschedule
    SimpleResolution,
}

impl PlanningConflictStrategy {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Escalate => "escalate",
            Self::MultiStepResolution => "multi_step_resolution",
            Self::BatchResolution => "batch_resolution",
            Self::SimpleResolution => "simple_resolution",
        }
    }
}

impl std::fmt::Display for PlanningConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Impact label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    /// One minor conflict
    Low,
    /// Several conflicts or one severe one
    Medium,
    /// Many, severe or long conflicts
    High,
}

/// Impact of a conflict set on a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictImpact {
    /// Number of conflicts
    pub total_conflicts: usize,
    /// Conflicts per severity label
    pub severity_counts: BTreeMap<String, usize>,
    /// Distinct affected attendees
    pub affected_attendees: usize,
    /// Share of scenario attendees affected, in [0, 1]
    pub affected_ratio: f64,
    /// Sum of overlaps in minutes
    pub total_time_impact_minutes: u64,
    /// Impact label
    pub complexity: ImpactLevel,
}

/// Planner answer to a conflict set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningConflictResolution {
    /// Scenario the conflicts belong to
    pub scenario_id: String,
    /// Selected strategy
    pub strategy: PlanningConflictStrategy,
    /// Impact analysis
    pub impact: ConflictImpact,
    /// Resolution steps
    pub steps: Vec<ExecutionStep>,
}

pub(crate) fn analyze_impact(scenario: &PlanningScenario, conflicts: &[Conflict]) -> ConflictImpact {
    let affected: BTreeSet<&str> = conflicts
        .iter()
        .flat_map(|c| c.affected_attendees.iter().map(String::as_str))
        .collect();
    let total_time_impact_minutes: u64 = conflicts.iter().map(|c| u64::from(c.overlap_minutes)).sum();
    let severe = conflicts
        .iter()
        .filter(|c| c.severity >= ConflictSeverity::High)
        .count();

    let complexity = if conflicts.len() >= 5 || severe >= 2 || total_time_impact_minutes > HIGH_IMPACT_OVERLAP_MINUTES {
        ImpactLevel::High
    } else if conflicts.len() >= 2 || severe == 1 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    };

    let affected_ratio = if scenario.attendees.is_empty() {
        0.0
    } else {
        let in_scenario = affected
            .iter()
            .filter(|a| scenario.attendees.iter().any(|s| s == *a))
            .count();
        in_scenario as f64 / scenario.attendees.len() as f64
    };

    ConflictImpact {
        total_conflicts: conflicts.len(),
        severity_counts: severity_histogram(conflicts),
        affected_attendees: affected.len(),
        affected_ratio,
        total_time_impact_minutes,
        complexity,
    }
}

pub(crate) fn select_strategy(conflicts: &[Conflict], impact: &ConflictImpact) -> PlanningConflictStrategy {
    if conflicts.iter().any(|c| c.severity == ConflictSeverity::Critical) {
        PlanningConflictStrategy::Escalate
    } else if impact.complexity == ImpactLevel::High {
        PlanningConflictStrategy::MultiStepResolution
    } else if impact.total_conflicts > 3 {
        PlanningConflictStrategy::BatchResolution
    } else {
        PlanningConflictStrategy::SimpleResolution
    }
}

pub(crate) fn strategy_steps(strategy: PlanningConflictStrategy, impact: &ConflictImpact) -> Vec<ExecutionStep> {
    let analyze = ExecutionStep::new("analyze_conflict_impact", ToolType::Analysis, StepPriority::High, 500)
        .with_input("impact", json!(impact));

    match strategy {
        PlanningConflictStrategy::Escalate => vec![
            analyze,
            ExecutionStep::new("escalate_to_organizer", ToolType::Notification, StepPriority::Critical, 300)
                .after("analyze_conflict_impact"),
        ],
        PlanningConflictStrategy::MultiStepResolution => vec![
            analyze,
            ExecutionStep::new("analyze_dependencies", ToolType::Analysis, StepPriority::High, 700)
                .after("analyze_conflict_impact"),
            ExecutionStep::new("generate_resolution_plan", ToolType::Ai, StepPriority::High, 2000)
                .after("analyze_dependencies"),
            ExecutionStep::new("execute_resolution_plan", ToolType::Calendar, StepPriority::Critical, 1500)
                .after("generate_resolution_plan"),
            ExecutionStep::new("verify_resolution", ToolType::Validation, StepPriority::Medium, 400)
                .after("execute_resolution_plan"),
        ],
        PlanningConflictStrategy::BatchResolution => vec![
            analyze,
            ExecutionStep::new("group_by_attendee", ToolType::Analysis, StepPriority::Medium, 600)
                .after("analyze_conflict_impact"),
            ExecutionStep::new("execute_batch_reschedule", ToolType::Calendar, StepPriority::Critical, 2500)
                .after("group_by_attendee"),
        ],
        PlanningConflictStrategy::SimpleResolution => vec![
            analyze,
            ExecutionStep::new("execute_simple_reschedule", ToolType::Calendar, StepPriority::High, 1000)
                .after("analyze_conflict_impact"),
        ],
    }
}
