//! Request complexity scoring

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attendee count beyond which the attendee term stops growing
const ATTENDEE_CAP: u64 = 10;
/// Upper bound of the duration term
const DURATION_CAP: u64 = 15;
const CONSTRAINTS_WEIGHT: u32 = 10;
const PREFERENCES_WEIGHT: u32 = 5;
const EXTERNAL_CALENDARS_WEIGHT: u32 = 15;

/// Four-level complexity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    /// score < 20
    Simple,
    /// 20 <= score < 40
    Moderate,
    /// 40 <= score < 60
    Complex,
    /// score >= 60
    VeryComplex,
}

impl ComplexityLevel {
    /// Map a score onto a label
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=19 => Self::Simple,
            20..=39 => Self::Moderate,
            40..=59 => Self::Complex,
            _ => Self::VeryComplex,
        }
    }

    /// Whether workflows should add AI optimization steps
    #[must_use]
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex | Self::VeryComplex)
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::VeryComplex => "very_complex",
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Breakdown of a request's complexity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityAnalysis {
    /// Total score
    pub score: u32,
    /// Label derived from the score
    pub level: ComplexityLevel,
    /// Number of attendees in the request
    pub attendee_count: usize,
    /// Requested duration
    pub duration_minutes: u64,
    /// `constraints` present
    pub has_constraints: bool,
    /// `preferences` present
    pub has_preferences: bool,
    /// `external_calendars` non-empty
    pub has_external_calendars: bool,
}

/// Score a request payload
#[must_use]
pub fn analyze_complexity(request: &Value) -> ComplexityAnalysis {
    let attendee_count = request
        .get("attendees")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    let duration_minutes = request
        .get("duration_minutes")
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0);
    let has_constraints = request.get("constraints").is_some_and(is_present);
    let has_preferences = request.get("preferences").is_some_and(is_present);
    let has_external_calendars = request.get("external_calendars").is_some_and(is_present);

    let mut score = ((attendee_count as u64).min(ATTENDEE_CAP) * 2) as u32;
    score += (duration_minutes / 8).min(DURATION_CAP) as u32;
    if has_constraints {
        score += CONSTRAINTS_WEIGHT;
    }
    if has_preferences {
        score += PREFERENCES_WEIGHT;
    }
    if has_external_calendars {
        score += EXTERNAL_CALENDARS_WEIGHT;
    }

    ComplexityAnalysis {
        score,
        level: ComplexityLevel::from_score(score),
        attendee_count,
        duration_minutes,
        has_constraints,
        has_preferences,
        has_external_calendars,
    }
}

/// Null, `false` and empty containers count as absent
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(ComplexityLevel::from_score(19), ComplexityLevel::Simple);
        assert_eq!(ComplexityLevel::from_score(20), ComplexityLevel::Moderate);
        assert_eq!(ComplexityLevel::from_score(40), ComplexityLevel::Complex);
        assert_eq!(ComplexityLevel::from_score(60), ComplexityLevel::VeryComplex);
    }

    #[test]
    fn test_caps() {
        let attendees: Vec<String> = (0..25).map(|i| format!("u{}@example.com", i)).collect();
        let analysis = analyze_complexity(&json!({
            "attendees": attendees,
            "duration_minutes": 600,
        }));

        assert_eq!(analysis.attendee_count, 25);
        assert_eq!(analysis.score, 20 + 15);
        assert_eq!(analysis.level, ComplexityLevel::Moderate);
    }

    #[test]
    fn test_flags() {
        let analysis = analyze_complexity(&json!({
            "attendees": ["a@example.com", "b@example.com"],
            "duration_minutes": 60,
            "constraints": {"no_mondays": true},
            "preferences": {},
            "external_calendars": ["outlook"],
        }));

        assert!(analysis.has_constraints);
        assert!(!analysis.has_preferences);
        assert_eq!(analysis.score, 4 + 7 + 10 + 15);
        assert_eq!(analysis.level, ComplexityLevel::Moderate);
    }

    #[test]
    fn test_empty_request() {
        let analysis = analyze_complexity(&json!({}));
        assert_eq!(analysis.score, 0);
        assert_eq!(analysis.level, ComplexityLevel::Simple);
    }
}
