//! Calendar conflicts and alternative slots
//!
//! Conflicts are detected by the calendar layer and handed to the router and
//! planner, which only read them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity of a detected conflict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    /// Cosmetic overlap
    Low,
    /// Needs attention
    #[default]
    Medium,
    /// Blocks attendance
    High,
    /// Requires a human decision
    Critical,
}

impl ConflictSeverity {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduling conflict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Conflict identifier
    pub conflict_id: String,
    /// Severity
    #[serde(default)]
    pub severity: ConflictSeverity,
    /// Overlapping time in minutes
    #[serde(default)]
    pub overlap_minutes: u32,
    /// Attendees affected by the overlap
    #[serde(default)]
    pub affected_attendees: Vec<String>,
    /// Calendar events involved
    #[serde(default)]
    pub event_ids: Vec<String>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

impl Conflict {
    /// Create a conflict with the given severity
    #[must_use]
    pub fn new(conflict_id: impl Into<String>, severity: ConflictSeverity) -> Self {
        Self {
            conflict_id: conflict_id.into(),
            severity,
            ..Default::default()
        }
    }

    /// Set the overlap in minutes
    #[must_use]
    pub fn with_overlap(mut self, minutes: u32) -> Self {
        self.overlap_minutes = minutes;
        self
    }

    /// Add an affected attendee
    #[must_use]
    pub fn with_attendee(mut self, attendee: impl Into<String>) -> Self {
        self.affected_attendees.push(attendee.into());
        self
    }
}

/// A candidate replacement slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlternativeSlot {
    /// Start (RFC 3339)
    pub start: String,
    /// End (RFC 3339)
    pub end: String,
    /// Fitness score in [0, 1]
    #[serde(default)]
    pub score: f64,
    /// Attendees free in this slot
    #[serde(default)]
    pub available_attendees: Vec<String>,
}

impl AlternativeSlot {
    /// Create a slot
    #[must_use]
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            ..Default::default()
        }
    }
}

/// Count conflicts per severity label
#[must_use]
pub fn severity_histogram(conflicts: &[Conflict]) -> BTreeMap<String, usize> {
    let mut histogram = BTreeMap::new();
    for conflict in conflicts {
        *histogram.entry(conflict.severity.to_string()).or_insert(0) += 1;
    }
    histogram
}
