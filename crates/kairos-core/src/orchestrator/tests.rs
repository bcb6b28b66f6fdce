use super::conflicts::interleave_resolution_steps;
use super::execution::merge_steps;
use super::executor::MockStepExecutor;
use super::*;
use crate::conflict::{AlternativeSlot, Conflict, ConflictSeverity};
use crate::planner::{PlanningStrategy, ScenarioPlanner};
use crate::router::{ResolutionStrategy, RouterError, TaskRouter};
use crate::step::{ExecutionStep, StepPriority, TaskType, ToolType};
use kairos_tools::{tool_fn, JsonMap, ToolGateway, ToolResult, ToolSchema};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn orchestrator(executor: Arc<dyn StepExecutor>, config: OrchestratorConfig) -> ExecutionOrchestrator {
    ExecutionOrchestrator::new(
        Arc::new(TaskRouter::default()),
        Arc::new(ScenarioPlanner::default()),
        executor,
        config,
    )
}

fn simulated() -> ExecutionOrchestrator {
    orchestrator(Arc::new(SimulatedStepExecutor), OrchestratorConfig::default())
}

fn meeting_request() -> Value {
    json!({
        "title": "Design review",
        "attendees": ["ana@example.com", "ben@example.com", "chloe@example.com"],
        "duration_minutes": 60,
        "time_range": {"start": "2026-10-20T09:00:00Z", "end": "2026-10-23T17:00:00Z"},
    })
}

fn failing_at(action: &'static str) -> MockStepExecutor {
    let mut mock = MockStepExecutor::new();
    mock.expect_execute().returning(move |step: &ExecutionStep| {
        if step.action == action {
            Ok(ToolResult::failure(&step.action, "inv", "calendar unavailable", 5))
        } else {
            Ok(ToolResult::success(&step.action, "inv", JsonMap::new(), 5))
        }
    });
    mock
}

#[tokio::test]
async fn test_intelligent_scheduling_completes() {
    let orchestrator = simulated();
    let outcome = orchestrator
        .execute_intelligent_scheduling(TaskType::ScheduleMeeting, &meeting_request(), "user_1", None, None)
        .await
        .unwrap();

    assert!(outcome.execution.is_success());
    let executed: Vec<&str> = outcome
        .execution
        .step_results
        .iter()
        .map(|r| r.step_id.as_str())
        .collect();
    assert_eq!(
        executed,
        vec![
            "analyze_constraints",
            "execute_constrained_plan",
            "analyze_request",
            "check_availability",
            "find_optimal_slots",
            "create_event",
            "send_invitations",
        ]
    );
    assert_eq!(outcome.planning.strategy, PlanningStrategy::Balanced);
    assert_eq!(outcome.planning.alternative_plans, 2);
    assert!(outcome
        .recommendations
        .iter()
        .any(|r| r.category == "alternatives_available" && r.priority == RecommendationPriority::Low));

    let record = orchestrator.get_execution_status(&outcome.execution_id).unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.completed_steps, 7);
    assert_eq!(record.context_id.as_deref(), Some(outcome.context_id.as_str()));

    let context = orchestrator.router().get_context(&outcome.context_id).unwrap();
    assert_eq!(context.current_step, 7);
    assert_eq!(context.total_steps, 7);
    assert!(context.is_complete());
    assert_eq!(context.accumulated_data["step_6"]["action"], json!("send_invitations"));
}

#[tokio::test]
async fn test_failed_step_returns_partial_results() {
    let orchestrator = orchestrator(Arc::new(failing_at("create_event")), OrchestratorConfig::default());
    let outcome = orchestrator
        .execute_intelligent_scheduling(
            TaskType::ScheduleMeeting,
            &meeting_request(),
            "user_1",
            None,
            Some(PlanningStrategy::Greedy),
        )
        .await
        .unwrap();

    let execution = &outcome.execution;
    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(execution.step_results.last().unwrap().action, "create_event");
    assert!(!execution.step_results.iter().any(|r| r.action == "send_invitations"));
    assert_eq!(execution.completed_steps, execution.step_results.len() - 1);
    assert_eq!(execution.errors.len(), 1);
    assert!(execution.errors[0].contains("calendar unavailable"));
    assert!(!outcome
        .recommendations
        .iter()
        .any(|r| r.category == "optimize_execution"));

    let record = orchestrator.get_execution_status(&execution.execution_id).unwrap();
    assert_eq!(record.status, ExecutionStatus::Failed);
    assert_eq!(record.failed_steps, 1);
}

#[tokio::test]
async fn test_continue_on_step_failure() {
    let orchestrator = orchestrator(
        Arc::new(failing_at("check_availability")),
        OrchestratorConfig::new().with_continue_on_step_failure(true),
    );
    let outcome = orchestrator
        .execute_intelligent_scheduling(TaskType::ScheduleMeeting, &meeting_request(), "user_1", None, None)
        .await
        .unwrap();

    assert_eq!(outcome.execution.status, ExecutionStatus::Failed);
    assert_eq!(outcome.execution.step_results.len(), outcome.execution.total_steps);
    assert_eq!(outcome.execution.completed_steps, outcome.execution.total_steps - 1);
}

#[tokio::test]
async fn test_executor_error_marks_step_failed() {
    let mut mock = MockStepExecutor::new();
    mock.expect_execute()
        .times(1)
        .returning(|_step: &ExecutionStep| Err(kairos_tools::Error::Execution("executor offline".to_string())));
    let orchestrator = orchestrator(Arc::new(mock), OrchestratorConfig::default());

    let outcome = orchestrator
        .execute_intelligent_scheduling(TaskType::CancelMeeting, &json!({"event_id": "evt_1"}), "user_1", None, None)
        .await
        .unwrap();

    assert_eq!(outcome.execution.status, ExecutionStatus::Failed);
    assert_eq!(outcome.execution.step_results.len(), 1);
    assert!(outcome.execution.errors[0].contains("executor offline"));
}

#[tokio::test]
async fn test_gateway_executor_invokes_tools_by_action() {
    let gateway = Arc::new(ToolGateway::default());
    let orchestrator = orchestrator(
        Arc::new(GatewayStepExecutor::new(Arc::clone(&gateway))),
        OrchestratorConfig::default(),
    );
    for action in [
        "validate_preferences",
        "store_preferences",
        "validate_inputs",
        "assess_risks",
        "execute_with_safeguards",
    ] {
        let echo = tool_fn(|inputs| async move { Ok(inputs) });
        gateway.register_tool(action, echo, ToolSchema::new(action)).unwrap();
    }

    let outcome = orchestrator
        .execute_intelligent_scheduling(
            TaskType::UpdatePreferences,
            &json!({"preferences": {"timezone": "UTC"}}),
            "user_1",
            None,
            Some(PlanningStrategy::Conservative),
        )
        .await
        .unwrap();

    assert!(outcome.execution.is_success());
    assert_eq!(outcome.execution.step_results.len(), 5);
    let stored = &outcome.execution.step_results[4];
    assert_eq!(stored.action, "store_preferences");
    assert_eq!(stored.data["preferences"], json!({"timezone": "UTC"}));
    assert_eq!(gateway.stats().succeeded, 5);
}

#[tokio::test]
async fn test_gateway_executor_reports_missing_tool() {
    let gateway = Arc::new(ToolGateway::default());
    let orchestrator = orchestrator(Arc::new(GatewayStepExecutor::new(gateway)), OrchestratorConfig::default());

    let outcome = orchestrator
        .execute_intelligent_scheduling(TaskType::FindAvailability, &json!({}), "user_1", None, None)
        .await
        .unwrap();

    assert_eq!(outcome.execution.status, ExecutionStatus::Failed);
    assert!(outcome.execution.errors[0].contains("tool not found"));
}

#[tokio::test]
async fn test_complex_conflicts_missing_context() {
    let orchestrator = simulated();
    let err = orchestrator
        .handle_complex_conflicts("ctx_missing", &[], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::ContextNotFound(id) if id == "ctx_missing"));
}

#[tokio::test]
async fn test_complex_conflicts_merge_and_execute() {
    let orchestrator = simulated();
    let (context_id, _) = orchestrator
        .router()
        .plan_execution(TaskType::ResolveConflict, &meeting_request(), "user_1", None)
        .unwrap();

    let conflicts = vec![Conflict::new("c1", ConflictSeverity::Medium).with_overlap(30)];
    let alternatives = vec![
        AlternativeSlot::new("2026-10-21T10:00:00Z", "2026-10-21T11:00:00Z"),
        AlternativeSlot::new("2026-10-22T10:00:00Z", "2026-10-22T11:00:00Z"),
    ];
    let outcome = orchestrator
        .handle_complex_conflicts(&context_id, &conflicts, &alternatives)
        .await
        .unwrap();

    assert_eq!(outcome.router_strategy, ResolutionStrategy::ProposeAlternatives);
    assert_eq!(outcome.conflicts_resolved, 1);
    assert_eq!(outcome.steps_executed, 5);
    let executed: Vec<&str> = outcome
        .execution
        .step_results
        .iter()
        .map(|r| r.action.as_str())
        .collect();
    assert_eq!(
        executed,
        vec![
            "analyze_conflict_impact",
            "execute_simple_reschedule",
            "rank_alternatives",
            "send_proposals",
            "await_selection",
        ]
    );

    let context = orchestrator.router().get_context(&context_id).unwrap();
    assert_eq!(context.conflict_history.len(), 1);
    assert_eq!(context.current_step, 5);
    assert_eq!(context.total_steps, 5);
}

#[test]
fn test_interleave_resolution_steps() {
    let step = |action: &str| ExecutionStep::new(action, ToolType::Analysis, StepPriority::Medium, 10);
    let planner_steps = vec![step("analyze_a"), step("execute_plan"), step("analyze_b")];
    let router_steps = vec![
        step("notify_organizer"),
        step("analyze_conflict_details"),
        step("update_event"),
        step("await_selection"),
    ];
    let actions: Vec<String> = interleave_resolution_steps(&planner_steps, &router_steps)
        .into_iter()
        .map(|s| s.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            "analyze_a",
            "analyze_b",
            "execute_plan",
            "update_event",
            "notify_organizer",
            "analyze_conflict_details",
            "await_selection",
        ]
    );
}

#[tokio::test]
async fn test_conflict_steps_run_after_their_dependencies() {
    let orchestrator = simulated();
    let (context_id, _) = orchestrator
        .router()
        .plan_execution(TaskType::ResolveConflict, &meeting_request(), "user_1", None)
        .unwrap();

    let conflicts = vec![Conflict::new("c1", ConflictSeverity::High).with_overlap(45)];
    let alternatives = vec![AlternativeSlot::new("2026-10-21T10:00:00Z", "2026-10-21T11:00:00Z")];
    let outcome = orchestrator
        .handle_complex_conflicts(&context_id, &conflicts, &alternatives)
        .await
        .unwrap();

    assert_eq!(outcome.router_strategy, ResolutionStrategy::AutoReschedule);
    let executed: Vec<&str> = outcome
        .execution
        .step_results
        .iter()
        .map(|r| r.step_id.as_str())
        .collect();
    assert_eq!(
        executed,
        vec![
            "analyze_conflict_impact",
            "execute_simple_reschedule",
            "select_best_alternative",
            "update_event",
            "notify_attendees",
        ]
    );

    let context = orchestrator.router().get_context(&context_id).unwrap();
    assert_eq!(context.total_steps, executed.len());
    assert!(context.is_complete());
}

#[test]
fn test_merge_steps_dedupes_by_identity() {
    let a = ExecutionStep::new("check_availability", ToolType::Calendar, StepPriority::High, 100);
    let renamed = a.clone().with_id("check_availability_2");
    let planner_steps = vec![a.clone()];
    let router_steps = vec![a.clone().after("analyze_request"), renamed];
    let merged = merge_steps(&[planner_steps.as_slice(), router_steps.as_slice()]);

    assert_eq!(merged.len(), 2);
    assert!(merged[0].dependencies.is_empty());
    assert_eq!(merged[1].step_id, "check_availability_2");
}

#[test]
fn test_multi_step_operation() {
    let orchestrator = simulated();
    let operations = vec![
        OperationRequest::new(TaskType::CancelMeeting, json!({"event_id": "evt_1"})),
        OperationRequest::new(TaskType::ScheduleMeeting, meeting_request()),
    ];
    let goals = vec!["minimize_disruption".to_string()];

    let plan = orchestrator
        .optimize_multi_step_operation(&operations, "user_1", &goals)
        .unwrap();

    assert_eq!(plan.context_ids.len(), 2);
    assert_eq!(plan.planning.strategy, PlanningStrategy::Optimal);
    assert_eq!(plan.steps.len(), 3 + 5);
    assert!(plan.steps[0].step_id.starts_with("op"));
    assert!(plan
        .steps
        .iter()
        .any(|s| s.step_id == "op0_cancel_event" && s.dependencies == vec!["op0_fetch_event".to_string()]));

    for pair in plan.steps.windows(2) {
        let key = |s: &ExecutionStep| (std::cmp::Reverse(s.priority), s.estimated_duration_ms);
        assert!(key(&pair[0]) <= key(&pair[1]));
    }
    assert_eq!(plan.steps[0].step_id, "op0_cancel_event");
    assert_eq!(
        plan.estimated_total_ms,
        plan.steps.iter().map(|s| s.estimated_duration_ms).sum::<u64>()
    );

    let contexts: HashMap<_, _> = plan
        .context_ids
        .iter()
        .map(|id| (id.clone(), orchestrator.router().get_context(id).unwrap()))
        .collect();
    let sessions: Vec<&String> = contexts.values().map(|c| &c.session_id).collect();
    assert_eq!(sessions[0], sessions[1]);
}

#[test]
fn test_multi_step_failure_releases_created_contexts() {
    let orchestrator = simulated();
    let operations = vec![
        OperationRequest::new(TaskType::CancelMeeting, json!({"event_id": "evt_1"})),
        OperationRequest::new(TaskType::FindAvailability, json!("not an object")),
    ];

    let err = orchestrator
        .optimize_multi_step_operation(&operations, "user_1", &[])
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Router(RouterError::InvalidRequest(_))));
    assert_eq!(orchestrator.router().active_contexts(), 0);
    assert_eq!(orchestrator.router().execution_history(10).len(), 1);
}

#[test]
fn test_multi_step_requires_operations() {
    let orchestrator = simulated();
    let err = orchestrator
        .optimize_multi_step_operation(&[], "user_1", &[])
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::InvalidOperation(_)));
}

#[tokio::test]
async fn test_cleanup_execution_cascades_to_router() {
    let orchestrator = simulated();
    let outcome = orchestrator
        .execute_intelligent_scheduling(TaskType::FindAvailability, &meeting_request(), "user_1", None, None)
        .await
        .unwrap();

    let record = orchestrator.cleanup_execution(&outcome.execution_id).unwrap();
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert!(orchestrator.get_execution_status(&outcome.execution_id).is_none());
    assert!(orchestrator.router().get_context(&outcome.context_id).is_none());
    assert_eq!(orchestrator.router().execution_history(1)[0].context_id, outcome.context_id);
    assert!(orchestrator.cleanup_execution(&outcome.execution_id).is_none());
}
