//! Planning scenarios built from request payloads

use crate::router::ComplexityLevel;
use crate::step::TaskType;
use kairos_tools::JsonMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Conflict tolerance used when preferences do not set one
pub const DEFAULT_CONFLICT_TOLERANCE: f64 = 0.5;

/// Preference keys copied into [`PlanningScenario::time_preferences`]
const TIME_PREFERENCE_KEYS: [&str; 4] = ["preferred_times", "timezone", "buffer_minutes", "business_hours"];

/// One planning constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningConstraint {
    /// Constraint kind, e.g. `time_window`
    pub constraint_type: String,
    /// Constraint payload
    pub value: Value,
    /// Importance in [0, 1]
    pub weight: f64,
    /// Hard constraints must hold; soft ones are preferences
    pub is_hard: bool,
}

impl PlanningConstraint {
    /// Hard constraint with weight 1.0
    #[must_use]
    pub fn hard(constraint_type: impl Into<String>, value: Value) -> Self {
        Self {
            constraint_type: constraint_type.into(),
            value,
            weight: 1.0,
            is_hard: true,
        }
    }

    /// Soft constraint; weight is clamped to [0, 1]
    #[must_use]
    pub fn soft(constraint_type: impl Into<String>, value: Value, weight: f64) -> Self {
        Self {
            constraint_type: constraint_type.into(),
            value,
            weight: weight.clamp(0.0, 1.0),
            is_hard: false,
        }
    }
}

/// Rich task description consumed by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningScenario {
    /// Scenario identifier; identical inputs produce identical ids
    pub scenario_id: String,
    /// Primary task
    pub task_type: TaskType,
    /// Ordered constraints
    pub constraints: Vec<PlanningConstraint>,
    /// Attendee addresses
    pub attendees: Vec<String>,
    /// Timezone, preferred times and similar
    pub time_preferences: JsonMap,
    /// Rooms, equipment and other resources
    pub resource_requirements: Vec<String>,
    /// Willingness to accept conflicts, in [0, 1]
    pub conflict_tolerance: f64,
    /// Goals the plan should optimize for
    pub optimization_goals: Vec<String>,
    /// Fallbacks when no plan satisfies the constraints
    pub fallback_options: Vec<String>,
}

impl PlanningScenario {
    /// Hard constraints only
    pub fn hard_constraints(&self) -> impl Iterator<Item = &PlanningConstraint> {
        self.constraints.iter().filter(|c| c.is_hard)
    }

    /// Check value ranges
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.conflict_tolerance) {
            return Err(format!(
                "conflict tolerance {} is outside [0, 1]",
                self.conflict_tolerance
            ));
        }
        if let Some(c) = self.constraints.iter().find(|c| !(0.0..=1.0).contains(&c.weight)) {
            return Err(format!(
                "constraint '{}' has weight {} outside [0, 1]",
                c.constraint_type, c.weight
            ));
        }
        Ok(())
    }
}

/// Derive a scenario from a request and the user's preferences
#[must_use]
pub fn create_planning_scenario(task_type: TaskType, request_data: &Value, user_preferences: &Value) -> PlanningScenario {
    let mut constraints = Vec::new();
    if let Some(time_range) = request_data.get("time_range").filter(|v| !v.is_null()) {
        constraints.push(PlanningConstraint::hard("time_window", time_range.clone()));
    }
    if flag(user_preferences, "respect_business_hours") {
        let hours = user_preferences
            .get("business_hours")
            .cloned()
            .unwrap_or_else(|| json!({"start": "09:00", "end": "17:00"}));
        constraints.push(PlanningConstraint::soft("business_hours", hours, 0.8));
    }
    if let Some(duration) = request_data.get("duration_minutes").filter(|v| v.is_number()) {
        constraints.push(PlanningConstraint::hard("duration", duration.clone()));
    }
    if let Some(priority) = request_data.get("priority").filter(|v| !v.is_null()) {
        constraints.push(PlanningConstraint::soft("priority", priority.clone(), 0.6));
    }

    let attendees = strings(request_data.get("attendees"));

    let mut time_preferences = JsonMap::new();
    for key in TIME_PREFERENCE_KEYS {
        if let Some(value) = user_preferences.get(key).filter(|v| !v.is_null()) {
            time_preferences.insert(key.to_string(), value.clone());
        }
    }

    let mut resource_requirements = strings(request_data.get("resources"));
    if let Some(location) = request_data.get("location").and_then(Value::as_str) {
        resource_requirements.push(format!("location:{}", location));
    }

    let conflict_tolerance = user_preferences
        .get("conflict_tolerance")
        .and_then(Value::as_f64)
        .map_or(DEFAULT_CONFLICT_TOLERANCE, |t| t.clamp(0.0, 1.0));

    let mut optimization_goals: Vec<String> = task_goals(task_type).iter().map(|g| (*g).to_string()).collect();
    if flag(request_data, "urgent") {
        optimization_goals.push("minimize_time".to_string());
    }
    if flag(request_data, "minimize_travel") {
        optimization_goals.push("minimize_travel".to_string());
    }

    let mut fallback_options = vec!["reduce_attendees".to_string(), "extend_time_window".to_string()];
    if task_type == TaskType::ScheduleMeeting {
        fallback_options.push("split_meeting".to_string());
    }

    let scenario_id = scenario_id(&[task_type.as_str(), &request_data.to_string(), &user_preferences.to_string()]);

    PlanningScenario {
        scenario_id,
        task_type,
        constraints,
        attendees,
        time_preferences,
        resource_requirements,
        conflict_tolerance,
        optimization_goals,
        fallback_options,
    }
}

/// Merge several scenarios into one for multi-step optimization
///
/// Attendees, resources, constraints and fallbacks are unioned in first-seen
/// order. `goals` replaces the merged goal list unless it is empty. The
/// tolerance of the merged scenario is the lowest of its parts.
#[must_use]
pub fn integrate_scenarios(scenarios: &[PlanningScenario], goals: &[String]) -> PlanningScenario {
    let task_type = scenarios
        .first()
        .map_or(TaskType::ScheduleMeeting, |s| s.task_type);

    let mut merged = PlanningScenario {
        scenario_id: String::new(),
        task_type,
        constraints: Vec::new(),
        attendees: Vec::new(),
        time_preferences: JsonMap::new(),
        resource_requirements: Vec::new(),
        conflict_tolerance: scenarios
            .iter()
            .map(|s| s.conflict_tolerance)
            .reduce(f64::min)
            .unwrap_or(DEFAULT_CONFLICT_TOLERANCE),
        optimization_goals: Vec::new(),
        fallback_options: Vec::new(),
    };

    for scenario in scenarios {
        for constraint in &scenario.constraints {
            if !merged.constraints.contains(constraint) {
                merged.constraints.push(constraint.clone());
            }
        }
        push_unique(&mut merged.attendees, &scenario.attendees);
        push_unique(&mut merged.resource_requirements, &scenario.resource_requirements);
        push_unique(&mut merged.optimization_goals, &scenario.optimization_goals);
        push_unique(&mut merged.fallback_options, &scenario.fallback_options);
        for (key, value) in &scenario.time_preferences {
            merged.time_preferences.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    if !goals.is_empty() {
        merged.optimization_goals = goals.to_vec();
    }

    let ids: Vec<&str> = scenarios.iter().map(|s| s.scenario_id.as_str()).collect();
    let goal_key = goals.join(",");
    let mut parts = ids;
    parts.push(&goal_key);
    merged.scenario_id = scenario_id(&parts);
    merged
}

/// Goals implied by the task type
fn task_goals(task_type: TaskType) -> &'static [&'static str] {
    match task_type {
        TaskType::ScheduleMeeting => &["maximize_attendance", "respect_preferences"],
        TaskType::ResolveConflict => &["minimize_disruption", "preserve_priorities"],
        TaskType::FindAvailability => &["maximize_options", "respect_preferences"],
        TaskType::RescheduleMeeting => &["minimize_disruption", "maximize_attendance"],
        TaskType::CancelMeeting => &["notify_promptly"],
        TaskType::UpdatePreferences => &["consistency"],
        TaskType::GenerateCommunication => &["clarity", "appropriate_tone"],
    }
}

/// Label the scenario's overall size, reusing the router's scale
pub(crate) fn scenario_level(scenario: &PlanningScenario) -> ComplexityLevel {
    let attendees = scenario.attendees.len().min(10) as u32 * 2;
    let constraints = scenario.constraints.len() as u32 * 5;
    let resources = scenario.resource_requirements.len() as u32 * 3;
    ComplexityLevel::from_score(attendees + constraints + resources)
}

fn scenario_id(parts: &[&str]) -> String {
    let mut hasher = DefaultHasher::new();
    parts.hash(&mut hasher);
    format!("scn_{:016x}", hasher.finish())
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
