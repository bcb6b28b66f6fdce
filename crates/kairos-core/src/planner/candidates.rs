//! Candidate plan generation per strategy

use super::scenario::{scenario_level, PlanningScenario};
use super::PlanningStrategy;
use crate::step::{ExecutionStep, StepPriority, ToolType};
use serde_json::json;

/// Candidate plans for `strategy`, in generation order
pub(crate) fn generate_candidates(scenario: &PlanningScenario, strategy: PlanningStrategy) -> Vec<Vec<ExecutionStep>> {
    match strategy {
        PlanningStrategy::Greedy => vec![greedy_plan(scenario)],
        PlanningStrategy::Optimal => optimal_plans(scenario),
        PlanningStrategy::Balanced => {
            let mut candidates = vec![greedy_plan(scenario)];
            candidates.extend(optimal_plans(scenario).into_iter().take(2));
            candidates
        }
        PlanningStrategy::Conservative => vec![conservative_plan(scenario)],
    }
}

/// Fast three-step plan: first acceptable slot wins
fn greedy_plan(scenario: &PlanningScenario) -> Vec<ExecutionStep> {
    vec![
        ExecutionStep::new("quick_availability_check", ToolType::Calendar, StepPriority::High, 800)
            .with_input("attendees", json!(scenario.attendees)),
        ExecutionStep::new("select_first_slot", ToolType::Analysis, StepPriority::Medium, 300)
            .after("quick_availability_check"),
        ExecutionStep::new("execute_task", ToolType::Calendar, StepPriority::Critical, 1000)
            .after("select_first_slot")
            .with_input("task_type", json!(scenario.task_type)),
    ]
}

/// AI-driven four-step plan and a two-step constraint-analysis plan
fn optimal_plans(scenario: &PlanningScenario) -> Vec<Vec<ExecutionStep>> {
    let ai_driven = vec![
        ExecutionStep::new("ai_analyze_constraints", ToolType::Ai, StepPriority::High, 1500)
            .with_input("constraints", json!(scenario.constraints))
            .with_input("scenario_level", json!(scenario_level(scenario))),
        ExecutionStep::new("ai_generate_candidates", ToolType::Ai, StepPriority::High, 2000)
            .after("ai_analyze_constraints")
            .with_input("goals", json!(scenario.optimization_goals)),
        ExecutionStep::new("evaluate_candidates", ToolType::Analysis, StepPriority::Medium, 800)
            .after("ai_generate_candidates"),
        ExecutionStep::new("execute_optimal_plan", ToolType::Calendar, StepPriority::Critical, 1200)
            .after("evaluate_candidates")
            .with_input("task_type", json!(scenario.task_type)),
    ];

    let hard: Vec<_> = scenario.hard_constraints().collect();
    let constraint_analysis = vec![
        ExecutionStep::new("analyze_constraints", ToolType::Analysis, StepPriority::High, 600)
            .with_input("hard_constraints", json!(hard)),
        ExecutionStep::new("execute_constrained_plan", ToolType::Calendar, StepPriority::Critical, 1000)
            .after("analyze_constraints")
            .with_input("task_type", json!(scenario.task_type)),
    ];

    vec![ai_driven, constraint_analysis]
}

/// Three-step plan with validation and risk assessment before acting
fn conservative_plan(scenario: &PlanningScenario) -> Vec<ExecutionStep> {
    vec![
        ExecutionStep::new("validate_inputs", ToolType::Validation, StepPriority::High, 400)
            .with_input("constraints", json!(scenario.constraints))
            .with_input("attendees", json!(scenario.attendees)),
        ExecutionStep::new("assess_risks", ToolType::Analysis, StepPriority::High, 700)
            .after("validate_inputs")
            .with_input("conflict_tolerance", json!(scenario.conflict_tolerance))
            .with_input("fallback_options", json!(scenario.fallback_options)),
        ExecutionStep::new("execute_with_safeguards", ToolType::Calendar, StepPriority::Critical, 1500)
            .after("assess_risks")
            .with_input("task_type", json!(scenario.task_type)),
    ]
}
