//! Integration tests for Kairos
//!
//! These tests verify the integration between the crates:
//! - kairos-tools: gateway validation, retries, audit and aggregation
//! - kairos-core: planning, routing and orchestrated execution through the gateway

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use kairos_core::{
    AlternativeSlot, Conflict, ConflictSeverity, ExecutionOrchestrator, ExecutionStatus, GatewayStepExecutor,
    KairosConfig, PlanningStrategy, ResolutionStrategy, ScenarioPlanner, SimulatedStepExecutor, TaskType,
};
use kairos_tools::{
    aggregate_results, tool_fn, AggregationStrategy, AuditQuery, FieldSpec, JsonMap, Tool, ToolCallSpec,
    ToolGateway, ToolSchema,
};
use serde_json::{json, Value};

fn meeting_request() -> Value {
    json!({
        "title": "Quarterly planning",
        "attendees": [
            "ana@example.com",
            "ben@example.com",
            "chloe@example.com",
            "dev@example.com",
            "eli@example.com",
        ],
        "duration_minutes": 90,
        "time_range": {"start": "2026-10-20T09:00:00Z", "end": "2026-10-24T17:00:00Z"},
    })
}

fn echo_tool(calls: Arc<AtomicU32>) -> Arc<dyn Tool> {
    tool_fn(move |inputs| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs)
        }
    })
}

/// Gateway with an echo tool for every action of a greedy schedule run
fn scheduling_gateway(calls: Arc<AtomicU32>) -> Arc<ToolGateway> {
    let gateway = Arc::new(ToolGateway::default());
    for action in [
        "quick_availability_check",
        "select_first_slot",
        "execute_task",
        "analyze_request",
        "find_optimal_slots",
        "create_event",
        "send_invitations",
    ] {
        gateway
            .register_tool(action, echo_tool(Arc::clone(&calls)), ToolSchema::new(action))
            .unwrap();
    }
    gateway
        .register_tool(
            "check_availability",
            echo_tool(Arc::clone(&calls)),
            ToolSchema::new("check_availability")
                .required_input("attendees", FieldSpec::array().with_min_length(1)),
        )
        .unwrap();
    gateway
}

// ============================================================================
// Planner Integration Tests
// ============================================================================

#[test]
fn test_concrete_balanced_scenario() {
    let planner = ScenarioPlanner::default();
    let scenario = planner.create_planning_scenario(TaskType::ScheduleMeeting, &meeting_request(), &json!({}));

    let result = planner
        .plan_complex_scenario(&scenario, PlanningStrategy::Balanced)
        .unwrap();

    assert!(!result.recommended_plan.is_empty());
    assert!((0.0..=1.0).contains(&result.confidence_score));
    assert_eq!(
        result.execution_time_estimate_ms,
        result
            .recommended_plan
            .iter()
            .map(|s| s.estimated_duration_ms)
            .sum::<u64>()
    );

    let again = planner
        .plan_complex_scenario(&scenario, PlanningStrategy::Balanced)
        .unwrap();
    assert_eq!(result, again);
}

#[test]
fn test_scenario_ids_are_stable_across_planners() {
    let first = ScenarioPlanner::default().create_planning_scenario(
        TaskType::ScheduleMeeting,
        &meeting_request(),
        &json!({}),
    );
    let second = ScenarioPlanner::default().create_planning_scenario(
        TaskType::ScheduleMeeting,
        &meeting_request(),
        &json!({}),
    );
    assert_eq!(first.scenario_id, second.scenario_id);
}

// ============================================================================
// Orchestrated Execution Through The Gateway
// ============================================================================

#[tokio::test]
async fn test_scheduling_through_gateway() {
    let calls = Arc::new(AtomicU32::new(0));
    let gateway = scheduling_gateway(Arc::clone(&calls));
    let orchestrator = ExecutionOrchestrator::from_config(&KairosConfig::default(), Arc::clone(&gateway));

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

    assert_eq!(outcome.execution.status, ExecutionStatus::Completed);
    assert_eq!(outcome.execution.step_results.len(), 8);
    assert_eq!(calls.load(Ordering::SeqCst), 8);

    let created = outcome
        .execution
        .step_results
        .iter()
        .find(|r| r.action == "create_event")
        .unwrap();
    assert_eq!(created.data["title"], json!("Quarterly planning"));

    let records = gateway.query_audit(&AuditQuery::new().for_tool("create_event"));
    assert!(records.iter().any(|r| r.entry.action == "invocation_completed"));
    assert_eq!(gateway.stats().succeeded, 8);
}

#[tokio::test]
async fn test_validation_failure_stops_orchestrated_run() {
    let calls = Arc::new(AtomicU32::new(0));
    let gateway = scheduling_gateway(Arc::clone(&calls));
    let orchestrator = ExecutionOrchestrator::from_config(&KairosConfig::default(), gateway);

    let mut request = meeting_request();
    request.as_object_mut().unwrap().remove("attendees");

    let outcome = orchestrator
        .execute_intelligent_scheduling(
            TaskType::ScheduleMeeting,
            &request,
            "user_1",
            None,
            Some(PlanningStrategy::Greedy),
        )
        .await
        .unwrap();

    let execution = &outcome.execution;
    assert_eq!(execution.status, ExecutionStatus::Failed);
    let last = execution.step_results.last().unwrap();
    assert_eq!(last.action, "check_availability");
    assert_eq!(last.retry_count, 0);
    assert!(execution.errors[0].contains("missing required input 'attendees'"));
    // every step before the failing one ran exactly once; the failing tool never ran
    assert_eq!(calls.load(Ordering::SeqCst) as usize, execution.step_results.len() - 1);

    let record = orchestrator.get_execution_status(&execution.execution_id).unwrap();
    assert_eq!(record.status, ExecutionStatus::Failed);
    let context = orchestrator.router().get_context(&outcome.context_id).unwrap();
    assert_eq!(context.current_step, execution.step_results.len());
}

#[tokio::test]
async fn test_conflict_resolution_end_to_end() {
    let orchestrator = ExecutionOrchestrator::from_config(&KairosConfig::default(), Arc::new(ToolGateway::default()))
        .with_executor(Arc::new(SimulatedStepExecutor));

    let scheduled = orchestrator
        .execute_intelligent_scheduling(TaskType::ScheduleMeeting, &meeting_request(), "user_1", None, None)
        .await
        .unwrap();

    let conflicts = vec![Conflict::new("c1", ConflictSeverity::Medium)
        .with_overlap(30)
        .with_attendee("ben@example.com")];
    let alternatives = vec![
        AlternativeSlot::new("2026-10-21T14:00:00Z", "2026-10-21T15:30:00Z"),
        AlternativeSlot::new("2026-10-22T09:00:00Z", "2026-10-22T10:30:00Z"),
    ];

    let outcome = orchestrator
        .handle_complex_conflicts(&scheduled.context_id, &conflicts, &alternatives)
        .await
        .unwrap();

    assert_eq!(outcome.router_strategy, ResolutionStrategy::ProposeAlternatives);
    assert_eq!(outcome.conflicts_resolved, 1);
    assert!(!outcome.explanation.is_empty());

    let context = orchestrator.router().get_context(&scheduled.context_id).unwrap();
    assert_eq!(context.conflict_history.len(), 1);
    assert_eq!(
        context.current_step,
        scheduled.execution.step_results.len() + outcome.steps_executed
    );
}

// ============================================================================
// Gateway Batch And Aggregation
// ============================================================================

#[tokio::test]
async fn test_batch_then_aggregate() {
    let gateway = ToolGateway::default();
    let availability = tool_fn(|_inputs| async move {
        let mut out = JsonMap::new();
        out.insert("slots".to_string(), json!(4));
        Ok(out)
    });
    let mailer = tool_fn(|_inputs| async move {
        let mut out = JsonMap::new();
        out.insert("sent".to_string(), json!(true));
        Ok(out)
    });
    let broken = tool_fn(|_inputs| async move { Err(kairos_tools::Error::Execution("smtp down".to_string())) });
    gateway
        .register_tool("check_availability", availability, ToolSchema::new("check_availability"))
        .unwrap();
    gateway
        .register_tool("send_invitations", mailer, ToolSchema::new("send_invitations"))
        .unwrap();
    gateway
        .register_tool("notify_attendees", broken, ToolSchema::new("notify_attendees").with_max_retries(1))
        .unwrap();

    let results = gateway
        .invoke_tools_batch(
            vec![
                ToolCallSpec::new("check_availability", JsonMap::new()),
                ToolCallSpec::new("send_invitations", JsonMap::new()),
                ToolCallSpec::new("notify_attendees", JsonMap::new()),
            ],
            true,
            false,
        )
        .await;
    assert_eq!(results.len(), 3);
    assert_eq!(results[2].retry_count, 1);

    let merged = aggregate_results(&results, AggregationStrategy::Merge);
    let keys: Vec<&String> = merged["data"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["check_availability_slots", "send_invitations_sent"]);
    assert_eq!(merged["metadata"]["failed_tools"], json!(1));

    let reduced = aggregate_results(&results, AggregationStrategy::Reduce);
    let fastest = results.iter().min_by_key(|r| r.execution_time_ms).unwrap();
    let slowest = results.iter().max_by_key(|r| r.execution_time_ms).unwrap();
    assert_eq!(reduced["performance"]["fastest_tool"], json!(fastest.tool_name));
    assert_eq!(reduced["performance"]["slowest_tool"], json!(slowest.tool_name));
}

#[tokio::test]
async fn test_gateway_executor_shares_gateway() {
    let gateway = Arc::new(ToolGateway::default());
    let executor = GatewayStepExecutor::new(Arc::clone(&gateway));
    assert!(Arc::ptr_eq(executor.gateway(), &gateway));
}
