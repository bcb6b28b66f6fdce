//! Per-task workflow builders
//!
//! Each builder returns a dependency chain of steps. Step inputs are copied
//! from the request payload; absent fields are simply omitted.

use super::complexity::ComplexityAnalysis;
use crate::step::{ExecutionStep, StepPriority, TaskType, ToolType};
use kairos_tools::JsonMap;
use serde_json::{json, Value};

/// Build the step list for `task_type`
#[must_use]
pub fn build_workflow(task_type: TaskType, request: &Value, complexity: &ComplexityAnalysis) -> Vec<ExecutionStep> {
    match task_type {
        TaskType::ScheduleMeeting => schedule_meeting(request, complexity),
        TaskType::ResolveConflict => resolve_conflict(request),
        TaskType::FindAvailability => find_availability(request, complexity),
        TaskType::RescheduleMeeting => reschedule_meeting(request),
        TaskType::CancelMeeting => cancel_meeting(request),
        TaskType::UpdatePreferences => update_preferences(request),
        TaskType::GenerateCommunication => generate_communication(request),
    }
}

/// Copy the named request fields into an input map
fn pick(request: &Value, keys: &[&str]) -> JsonMap {
    let mut inputs = JsonMap::new();
    for key in keys {
        if let Some(value) = request.get(*key).filter(|v| !v.is_null()) {
            inputs.insert((*key).to_string(), value.clone());
        }
    }
    inputs
}

fn schedule_meeting(request: &Value, complexity: &ComplexityAnalysis) -> Vec<ExecutionStep> {
    let mut steps = vec![
        ExecutionStep::new("analyze_request", ToolType::Ai, StepPriority::High, 500).with_inputs(pick(
            request,
            &["title", "description", "attendees", "duration_minutes"],
        )),
        ExecutionStep::new("check_availability", ToolType::Calendar, StepPriority::High, 1500)
            .after("analyze_request")
            .with_inputs(pick(
                request,
                &["attendees", "time_range", "duration_minutes", "external_calendars"],
            )),
        ExecutionStep::new("find_optimal_slots", ToolType::Analysis, StepPriority::High, 1000)
            .after("check_availability")
            .with_inputs(pick(request, &["duration_minutes", "preferences", "constraints"])),
    ];

    let mut last = "find_optimal_slots";
    if complexity.level.is_complex() {
        steps.push(
            ExecutionStep::new("ai_optimize_schedule", ToolType::Ai, StepPriority::Medium, 2000)
                .after(last)
                .with_input("complexity", json!(complexity.level))
                .with_input("complexity_score", json!(complexity.score)),
        );
        last = "ai_optimize_schedule";
    }

    steps.push(
        ExecutionStep::new("create_event", ToolType::Calendar, StepPriority::Critical, 1000)
            .after(last)
            .with_inputs(pick(request, &["title", "attendees", "duration_minutes", "location"])),
    );
    steps.push(
        ExecutionStep::new("send_invitations", ToolType::Email, StepPriority::Medium, 800)
            .after("create_event")
            .with_inputs(pick(request, &["attendees", "title"])),
    );
    steps
}

fn resolve_conflict(request: &Value) -> Vec<ExecutionStep> {
    vec![
        ExecutionStep::new("detect_conflicts", ToolType::Calendar, StepPriority::High, 1200)
            .with_inputs(pick(request, &["event_id", "time_range", "attendees"])),
        ExecutionStep::new("analyze_conflicts", ToolType::Analysis, StepPriority::High, 800).after("detect_conflicts"),
        ExecutionStep::new("generate_alternatives", ToolType::Ai, StepPriority::Medium, 1500)
            .after("analyze_conflicts")
            .with_inputs(pick(request, &["preferences", "duration_minutes"])),
        ExecutionStep::new("apply_resolution", ToolType::Calendar, StepPriority::Critical, 1000)
            .after("generate_alternatives")
            .with_inputs(pick(request, &["event_id"])),
        ExecutionStep::new("notify_attendees", ToolType::Email, StepPriority::Medium, 600)
            .after("apply_resolution")
            .with_inputs(pick(request, &["attendees"])),
    ]
}

fn find_availability(request: &Value, complexity: &ComplexityAnalysis) -> Vec<ExecutionStep> {
    let mut steps = vec![
        ExecutionStep::new("fetch_calendars", ToolType::Calendar, StepPriority::High, 1500)
            .with_inputs(pick(request, &["attendees", "time_range", "external_calendars"])),
        ExecutionStep::new("compute_free_slots", ToolType::Analysis, StepPriority::High, 800)
            .after("fetch_calendars")
            .with_inputs(pick(request, &["duration_minutes", "time_range"])),
        ExecutionStep::new("rank_slots", ToolType::Analysis, StepPriority::Medium, 500)
            .after("compute_free_slots")
            .with_inputs(pick(request, &["preferences"])),
    ];
    if complexity.level.is_complex() {
        steps.push(
            ExecutionStep::new("ai_slot_recommendation", ToolType::Ai, StepPriority::Medium, 1500)
                .after("rank_slots")
                .with_input("complexity", json!(complexity.level)),
        );
    }
    steps
}

fn reschedule_meeting(request: &Value) -> Vec<ExecutionStep> {
    vec![
        ExecutionStep::new("fetch_event", ToolType::Calendar, StepPriority::High, 500)
            .with_inputs(pick(request, &["event_id"])),
        ExecutionStep::new("check_availability", ToolType::Calendar, StepPriority::High, 1500)
            .after("fetch_event")
            .with_inputs(pick(request, &["attendees", "time_range", "duration_minutes"])),
        ExecutionStep::new("find_optimal_slots", ToolType::Analysis, StepPriority::High, 1000)
            .after("check_availability")
            .with_inputs(pick(request, &["duration_minutes", "preferences"])),
        ExecutionStep::new("update_event", ToolType::Calendar, StepPriority::Critical, 1000)
            .after("find_optimal_slots")
            .with_inputs(pick(request, &["event_id"])),
        ExecutionStep::new("notify_attendees", ToolType::Email, StepPriority::Medium, 600)
            .after("update_event")
            .with_inputs(pick(request, &["attendees", "reason"])),
    ]
}

fn cancel_meeting(request: &Value) -> Vec<ExecutionStep> {
    let mut steps = vec![
        ExecutionStep::new("fetch_event", ToolType::Calendar, StepPriority::High, 500)
            .with_inputs(pick(request, &["event_id"])),
        ExecutionStep::new("cancel_event", ToolType::Calendar, StepPriority::Critical, 800)
            .after("fetch_event")
            .with_inputs(pick(request, &["event_id", "reason"])),
    ];
    let notify = request
        .get("notify_attendees")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    if notify {
        steps.push(
            ExecutionStep::new("notify_attendees", ToolType::Email, StepPriority::Medium, 600)
                .after("cancel_event")
                .with_inputs(pick(request, &["attendees", "reason"])),
        );
    }
    steps
}

fn update_preferences(request: &Value) -> Vec<ExecutionStep> {
    vec![
        ExecutionStep::new("validate_preferences", ToolType::Validation, StepPriority::High, 300)
            .with_inputs(pick(request, &["preferences"])),
        ExecutionStep::new("store_preferences", ToolType::Storage, StepPriority::High, 400)
            .after("validate_preferences")
            .with_inputs(pick(request, &["preferences"])),
    ]
}

fn generate_communication(request: &Value) -> Vec<ExecutionStep> {
    let mut steps = vec![
        ExecutionStep::new("gather_context", ToolType::Calendar, StepPriority::Medium, 800)
            .with_inputs(pick(request, &["event_id", "attendees"])),
        ExecutionStep::new("draft_message", ToolType::Ai, StepPriority::High, 2000)
            .after("gather_context")
            .with_inputs(pick(request, &["communication_type", "tone", "context"])),
        ExecutionStep::new("review_message", ToolType::Validation, StepPriority::Medium, 500).after("draft_message"),
    ];
    if request.get("send").and_then(Value::as_bool).unwrap_or(false) {
        steps.push(
            ExecutionStep::new("send_message", ToolType::Email, StepPriority::High, 800)
                .after("review_message")
                .with_inputs(pick(request, &["attendees"])),
        );
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::complexity::analyze_complexity;

    fn actions(steps: &[ExecutionStep]) -> Vec<&str> {
        steps.iter().map(|s| s.action.as_str()).collect()
    }

    #[test]
    fn test_every_task_type_has_a_chained_workflow() {
        let request = json!({"attendees": ["a@example.com"]});
        let complexity = analyze_complexity(&request);

        for task_type in TaskType::ALL {
            let steps = build_workflow(task_type, &request, &complexity);
            assert!(!steps.is_empty(), "{} produced no steps", task_type);
            assert!(steps[0].dependencies.is_empty());
            for pair in steps.windows(2) {
                assert_eq!(pair[1].dependencies, vec![pair[0].step_id.clone()]);
            }
        }
    }

    #[test]
    fn test_schedule_meeting_adds_ai_step_when_complex() {
        let simple = json!({"attendees": ["a@example.com"], "duration_minutes": 30});
        let steps = build_workflow(TaskType::ScheduleMeeting, &simple, &analyze_complexity(&simple));
        assert!(!actions(&steps).contains(&"ai_optimize_schedule"));

        let attendees: Vec<String> = (0..10).map(|i| format!("u{}@example.com", i)).collect();
        let complex = json!({
            "attendees": attendees,
            "duration_minutes": 120,
            "constraints": {"no_fridays": true},
        });
        let steps = build_workflow(TaskType::ScheduleMeeting, &complex, &analyze_complexity(&complex));
        assert_eq!(
            actions(&steps),
            vec![
                "analyze_request",
                "check_availability",
                "find_optimal_slots",
                "ai_optimize_schedule",
                "create_event",
                "send_invitations",
            ]
        );
        assert_eq!(steps[4].dependencies, vec!["ai_optimize_schedule".to_string()]);
    }

    #[test]
    fn test_inputs_copied_from_request() {
        let request = json!({"event_id": "evt_1", "reason": null, "notify_attendees": false});
        let steps = build_workflow(TaskType::CancelMeeting, &request, &analyze_complexity(&request));

        assert_eq!(actions(&steps), vec!["fetch_event", "cancel_event"]);
        assert_eq!(steps[1].inputs["event_id"], json!("evt_1"));
        assert!(!steps[1].inputs.contains_key("reason"));
    }
}
