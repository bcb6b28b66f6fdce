//! Conflict analysis and resolution-strategy selection

use crate::conflict::{severity_histogram, AlternativeSlot, Conflict, ConflictSeverity};
use crate::step::{ExecutionStep, StepPriority, ToolType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Overlap beyond which a set of conflicts is considered complex
const COMPLEX_OVERLAP_MINUTES: u64 = 240;
/// Conflict count beyond which a set of conflicts is considered complex
const COMPLEX_CONFLICT_COUNT: usize = 5;

/// How a set of conflicts is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Hand the decision to a person
    EscalateToHuman,
    /// Move the meeting to the best alternative
    AutoReschedule,
    /// Offer alternatives to the attendees
    ProposeAlternatives,
    /// Resolve many conflicts in one pass
    BatchResolution,
    /// Walk the organizer through the options
    InteractiveResolution,
}

impl ResolutionStrategy {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EscalateToHuman => "escalate_to_human",
            Self::AutoReschedule => "auto_reschedule",
            Self::ProposeAlternatives => "propose_alternatives",
            Self::BatchResolution => "batch_resolution",
            Self::InteractiveResolution => "interactive_resolution",
        }
    }
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Difficulty label of a conflict set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionComplexity {
    /// At most one low/medium conflict
    Simple,
    /// Several non-critical conflicts
    Moderate,
    /// Critical, numerous or long-overlapping conflicts
    Complex,
}

/// Summary of a conflict set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictAnalysis {
    /// Number of conflicts
    pub total_conflicts: usize,
    /// Conflicts per severity label
    pub severity_counts: BTreeMap<String, usize>,
    /// Sum of overlaps
    pub total_overlap_minutes: u64,
    /// Distinct affected attendees
    pub affected_attendees: usize,
    /// Any critical conflict
    pub has_critical: bool,
    /// Difficulty label
    pub complexity: ResolutionComplexity,
    /// Alternatives offered with the conflicts
    pub alternatives_available: usize,
}

/// Thresholds for strategy selection
#[derive(Debug, Clone, Copy)]
pub(crate) struct StrategyThresholds {
    /// Prior resolutions above which the run is escalated
    pub escalation_history: usize,
    /// Conflict count above which batch resolution is used
    pub batch_conflicts: usize,
}

/// Outcome of [`TaskRouter::handle_conflicts`](super::TaskRouter::handle_conflicts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// Context the resolution was recorded on
    pub context_id: String,
    /// Selected strategy
    pub strategy: ResolutionStrategy,
    /// Rule that selected the strategy
    pub rationale: String,
    /// User-facing explanation
    pub explanation: String,
    /// Analysis the decision was based on
    pub analysis: ConflictAnalysis,
    /// Steps that carry out the resolution
    pub steps: Vec<ExecutionStep>,
}

/// Summarize a conflict set
#[must_use]
pub fn analyze_conflicts(conflicts: &[Conflict], alternatives: &[AlternativeSlot]) -> ConflictAnalysis {
    let total_conflicts = conflicts.len();
    let total_overlap_minutes: u64 = conflicts.iter().map(|c| u64::from(c.overlap_minutes)).sum();
    let affected_attendees = conflicts
        .iter()
        .flat_map(|c| c.affected_attendees.iter())
        .collect::<BTreeSet<_>>()
        .len();
    let has_critical = conflicts.iter().any(|c| c.severity == ConflictSeverity::Critical);
    let max_severity = conflicts.iter().map(|c| c.severity).max();

    let complexity = if has_critical
        || total_conflicts > COMPLEX_CONFLICT_COUNT
        || total_overlap_minutes > COMPLEX_OVERLAP_MINUTES
    {
        ResolutionComplexity::Complex
    } else if total_conflicts <= 1 && max_severity.map_or(true, |s| s <= ConflictSeverity::Medium) {
        ResolutionComplexity::Simple
    } else {
        ResolutionComplexity::Moderate
    };

    ConflictAnalysis {
        total_conflicts,
        severity_counts: severity_histogram(conflicts),
        total_overlap_minutes,
        affected_attendees,
        has_critical,
        complexity,
        alternatives_available: alternatives.len(),
    }
}

/// First matching rule wins
pub(crate) fn select_strategy(
    analysis: &ConflictAnalysis,
    prior_resolutions: usize,
    thresholds: StrategyThresholds,
) -> (ResolutionStrategy, String) {
    let alternatives = analysis.alternatives_available;

    if analysis.has_critical {
        return (
            ResolutionStrategy::EscalateToHuman,
            "critical conflict requires a human decision".to_string(),
        );
    }
    if analysis.complexity == ResolutionComplexity::Simple && alternatives >= 2 {
        return (
            ResolutionStrategy::ProposeAlternatives,
            format!("simple conflict with {} alternatives available", alternatives),
        );
    }
    if analysis.total_conflicts == 1 && alternatives >= 1 {
        return (
            ResolutionStrategy::AutoReschedule,
            "single conflict with a viable alternative".to_string(),
        );
    }
    if prior_resolutions > thresholds.escalation_history {
        return (
            ResolutionStrategy::EscalateToHuman,
            format!("{} previous resolution attempts on this run", prior_resolutions),
        );
    }
    if analysis.total_conflicts > thresholds.batch_conflicts {
        return (
            ResolutionStrategy::BatchResolution,
            format!("{} conflicts resolved together", analysis.total_conflicts),
        );
    }
    (
        ResolutionStrategy::InteractiveResolution,
        "conflicts need organizer input".to_string(),
    )
}

/// Fixed step template per strategy
#[must_use]
pub fn resolution_steps(
    strategy: ResolutionStrategy,
    conflicts: &[Conflict],
    alternatives: &[AlternativeSlot],
) -> Vec<ExecutionStep> {
    let conflict_ids: Vec<&str> = conflicts.iter().map(|c| c.conflict_id.as_str()).collect();

    match strategy {
        ResolutionStrategy::EscalateToHuman => vec![
            ExecutionStep::new("summarize_conflicts", ToolType::Analysis, StepPriority::High, 500)
                .with_input("conflict_ids", json!(conflict_ids)),
            ExecutionStep::new("notify_organizer", ToolType::Notification, StepPriority::Critical, 300)
                .after("summarize_conflicts"),
            ExecutionStep::new("await_human_decision", ToolType::Validation, StepPriority::Critical, 100)
                .after("notify_organizer")
                .with_max_retries(0),
        ],
        ResolutionStrategy::AutoReschedule => {
            let best = alternatives
                .iter()
                .max_by(|a, b| a.score.total_cmp(&b.score))
                .map(|slot| json!(slot))
                .unwrap_or_default();
            vec![
                ExecutionStep::new("select_best_alternative", ToolType::Analysis, StepPriority::High, 300)
                    .with_input("alternative", best),
                ExecutionStep::new("update_event", ToolType::Calendar, StepPriority::Critical, 1000)
                    .after("select_best_alternative")
                    .with_input("conflict_ids", json!(conflict_ids)),
                ExecutionStep::new("notify_attendees", ToolType::Email, StepPriority::Medium, 600)
                    .after("update_event"),
            ]
        }
        ResolutionStrategy::ProposeAlternatives => vec![
            ExecutionStep::new("rank_alternatives", ToolType::Analysis, StepPriority::High, 400)
                .with_input("alternatives", json!(alternatives)),
            ExecutionStep::new("send_proposals", ToolType::Email, StepPriority::High, 800).after("rank_alternatives"),
            ExecutionStep::new("await_selection", ToolType::Validation, StepPriority::Medium, 200)
                .after("send_proposals")
                .with_max_retries(0),
        ],
        ResolutionStrategy::BatchResolution => vec![
            ExecutionStep::new("group_conflicts", ToolType::Analysis, StepPriority::High, 600)
                .with_input("conflict_ids", json!(conflict_ids)),
            ExecutionStep::new("analyze_batch", ToolType::Ai, StepPriority::High, 2000).after("group_conflicts"),
            ExecutionStep::new("execute_batch_updates", ToolType::Calendar, StepPriority::Critical, 3000)
                .after("analyze_batch"),
            ExecutionStep::new("notify_attendees", ToolType::Email, StepPriority::Medium, 800)
                .after("execute_batch_updates"),
        ],
        ResolutionStrategy::InteractiveResolution => vec![
            ExecutionStep::new("analyze_conflict_details", ToolType::Analysis, StepPriority::High, 500)
                .with_input("conflict_ids", json!(conflict_ids)),
            ExecutionStep::new("present_options", ToolType::Notification, StepPriority::High, 400)
                .after("analyze_conflict_details")
                .with_input("alternatives", json!(alternatives)),
            ExecutionStep::new("execute_user_choice", ToolType::Calendar, StepPriority::Critical, 1000)
                .after("present_options"),
        ],
    }
}

/// User-facing explanation of the selected strategy
#[must_use]
pub fn explain(strategy: ResolutionStrategy, analysis: &ConflictAnalysis) -> String {
    let subject = match analysis.total_conflicts {
        1 => "1 scheduling conflict".to_string(),
        n => format!("{} scheduling conflicts", n),
    };
    let detail = match strategy {
        ResolutionStrategy::EscalateToHuman => {
            "These need a decision from the organizer, so they have been escalated.".to_string()
        }
        ResolutionStrategy::AutoReschedule => {
            "The meeting will be moved to the best available alternative and attendees notified.".to_string()
        }
        ResolutionStrategy::ProposeAlternatives => format!(
            "{} alternative times will be proposed to the attendees.",
            analysis.alternatives_available
        ),
        ResolutionStrategy::BatchResolution => "They will be resolved together in a single pass.".to_string(),
        ResolutionStrategy::InteractiveResolution => {
            "The organizer will be shown the options and asked to choose.".to_string()
        }
    };
    format!(
        "Found {} affecting {} attendee(s) with {} minutes of overlap. {}",
        subject, analysis.affected_attendees, analysis.total_overlap_minutes, detail
    )
}
