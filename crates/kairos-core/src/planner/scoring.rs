//! Plan scoring, confidence and risk assessment

use super::scenario::PlanningScenario;
use crate::step::{ExecutionStep, StepPriority};
use serde::{Deserialize, Serialize};

/// Duration at which time efficiency reaches zero
const TIME_CEILING_MS: f64 = 10_000.0;
/// Step count at which compactness reaches zero
const STEP_CEILING: f64 = 10.0;
/// Fixed constraint-satisfaction estimate
const CONSTRAINT_SATISFACTION: f64 = 0.8;

const BASE_CONFIDENCE: f64 = 0.8;
const BASE_SUCCESS_RATE: f64 = 0.85;

/// Step duration flagged as long-running
const LONG_STEP_MS: u64 = 3000;

/// Metrics attached to a planning result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    /// Sum of step durations
    pub execution_time_estimate_ms: u64,
    /// Number of steps
    pub step_count: usize,
    /// Mean priority value (1-4)
    pub average_priority: f64,
    /// Dependencies per step
    pub dependency_density: f64,
    /// Ranking score of the plan
    pub plan_score: f64,
}

/// Total estimated duration of a plan
#[must_use]
pub fn total_duration_ms(plan: &[ExecutionStep]) -> u64 {
    plan.iter().map(|s| s.estimated_duration_ms).sum()
}

fn average_priority(plan: &[ExecutionStep]) -> f64 {
    if plan.is_empty() {
        return 0.0;
    }
    plan.iter().map(|s| f64::from(s.priority.value())).sum::<f64>() / plan.len() as f64
}

/// Weighted plan score; higher is better
#[must_use]
pub fn score_plan(plan: &[ExecutionStep]) -> f64 {
    let time_efficiency = (1.0 - total_duration_ms(plan) as f64 / TIME_CEILING_MS).max(0.0);
    let compactness = (1.0 - plan.len() as f64 / STEP_CEILING).max(0.0);
    let priority = average_priority(plan) / 4.0;

    0.3 * time_efficiency + 0.2 * compactness + 0.2 * priority + 0.3 * CONSTRAINT_SATISFACTION
}

/// Confidence that the plan fits the scenario, in [0, 1]
#[must_use]
pub fn confidence_score(scenario: &PlanningScenario, plan: &[ExecutionStep]) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if scenario.constraints.len() > 5 {
        confidence -= 0.1;
    }
    if scenario.attendees.len() > 10 {
        confidence -= 0.1;
    }
    if scenario.conflict_tolerance < 0.3 {
        confidence -= 0.1;
    }
    if plan.len() <= 5 {
        confidence += 0.1;
    }
    if plan.iter().all(|s| s.priority >= StepPriority::Medium) {
        confidence += 0.05;
    }
    confidence.clamp(0.0, 1.0)
}

/// Estimated probability that the plan runs to completion, in [0, 1]
#[must_use]
pub fn estimated_success_rate(scenario: &PlanningScenario, plan: &[ExecutionStep]) -> f64 {
    let retryable = plan.iter().filter(|s| s.allows_retries()).count() as f64;
    let critical = plan
        .iter()
        .filter(|s| s.priority == StepPriority::Critical)
        .count() as f64;

    let rate = BASE_SUCCESS_RATE + 0.02 * retryable - 0.05 * critical - 0.01 * scenario.constraints.len() as f64;
    rate.clamp(0.0, 1.0)
}

/// Free-text risk flags
#[must_use]
pub fn risk_factors(scenario: &PlanningScenario, plan: &[ExecutionStep]) -> Vec<String> {
    let mut risks = Vec::new();

    let critical = step_ids(plan, |s| s.priority == StepPriority::Critical);
    if !critical.is_empty() {
        risks.push(format!("critical steps without fallback: {}", critical));
    }
    let long_running = step_ids(plan, |s| s.estimated_duration_ms > LONG_STEP_MS);
    if !long_running.is_empty() {
        risks.push(format!("long-running steps (>{}ms): {}", LONG_STEP_MS, long_running));
    }
    let dependent = step_ids(plan, |s| s.dependencies.len() > 2);
    if !dependent.is_empty() {
        risks.push(format!("steps with more than 2 dependencies: {}", dependent));
    }
    if scenario.attendees.len() > 15 {
        risks.push(format!("large attendee list ({} attendees)", scenario.attendees.len()));
    }
    if scenario.conflict_tolerance < 0.2 {
        risks.push(format!("low conflict tolerance ({:.2})", scenario.conflict_tolerance));
    }
    risks
}

/// Metrics for the recommended plan
#[must_use]
pub fn optimization_metrics(plan: &[ExecutionStep]) -> OptimizationMetrics {
    let dependencies: usize = plan.iter().map(|s| s.dependencies.len()).sum();
    OptimizationMetrics {
        execution_time_estimate_ms: total_duration_ms(plan),
        step_count: plan.len(),
        average_priority: average_priority(plan),
        dependency_density: if plan.is_empty() {
            0.0
        } else {
            dependencies as f64 / plan.len() as f64
        },
        plan_score: score_plan(plan),
    }
}

fn step_ids(plan: &[ExecutionStep], pred: impl Fn(&ExecutionStep) -> bool) -> String {
    plan.iter()
        .filter(|s| pred(s))
        .map(|s| s.step_id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
