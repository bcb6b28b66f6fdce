//! Recommendation rules

use super::config::OrchestratorConfig;
use super::types::{ExecutionOutcome, PlanningSummary, Recommendation, RecommendationPriority};

/// Derive recommendations from planning metadata and the run outcome
pub(crate) fn build_recommendations(
    planning: &PlanningSummary,
    execution: &ExecutionOutcome,
    config: &OrchestratorConfig,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if planning.confidence_score < config.low_confidence_threshold {
        recommendations.push(Recommendation {
            category: "review_constraints".to_string(),
            priority: RecommendationPriority::Medium,
            message: format!(
                "Plan confidence is {:.2}. Review the scheduling constraints for conflicts or over-specification.",
                planning.confidence_score
            ),
        });
    }

    for risk in &planning.risk_factors {
        recommendations.push(Recommendation {
            category: "risk_mitigation".to_string(),
            priority: RecommendationPriority::High,
            message: format!("Address risk before relying on this schedule: {}", risk),
        });
    }

    if planning.alternative_plans > 0 {
        recommendations.push(Recommendation {
            category: "alternatives_available".to_string(),
            priority: RecommendationPriority::Low,
            message: format!("{} alternative plan(s) are available.", planning.alternative_plans),
        });
    }

    if execution.is_success() && execution.total_execution_time_ms > config.slow_execution_ms {
        recommendations.push(Recommendation {
            category: "optimize_execution".to_string(),
            priority: RecommendationPriority::Medium,
            message: format!(
                "Execution took {}ms. Consider a greedy strategy or fewer steps.",
                execution.total_execution_time_ms
            ),
        });
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::types::ExecutionStatus;
    use crate::planner::{OptimizationMetrics, PlanningStrategy};

    fn planning(confidence: f64, risks: &[&str], alternatives: usize) -> PlanningSummary {
        PlanningSummary {
            scenario_id: "scn_1".to_string(),
            strategy: PlanningStrategy::Balanced,
            confidence_score: confidence,
            estimated_success_rate: 0.8,
            risk_factors: risks.iter().map(|r| (*r).to_string()).collect(),
            optimization_metrics: OptimizationMetrics {
                execution_time_estimate_ms: 0,
                step_count: 0,
                average_priority: 0.0,
                dependency_density: 0.0,
                plan_score: 0.0,
            },
            alternative_plans: alternatives,
        }
    }

    fn execution(status: ExecutionStatus, total_ms: u64) -> ExecutionOutcome {
        ExecutionOutcome {
            execution_id: "exec_1".to_string(),
            status,
            step_results: Vec::new(),
            completed_steps: 0,
            total_steps: 0,
            total_execution_time_ms: total_ms,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_no_recommendations_for_clean_run() {
        let recs = build_recommendations(
            &planning(0.9, &[], 0),
            &execution(ExecutionStatus::Completed, 500),
            &OrchestratorConfig::default(),
        );
        assert!(recs.is_empty());
    }

    #[test]
    fn test_all_rules() {
        let recs = build_recommendations(
            &planning(0.6, &["critical steps without fallback: create_event"], 2),
            &execution(ExecutionStatus::Completed, 12_000),
            &OrchestratorConfig::default(),
        );
        let categories: Vec<(&str, RecommendationPriority)> =
            recs.iter().map(|r| (r.category.as_str(), r.priority)).collect();
        assert_eq!(
            categories,
            vec![
                ("review_constraints", RecommendationPriority::Medium),
                ("risk_mitigation", RecommendationPriority::High),
                ("alternatives_available", RecommendationPriority::Low),
                ("optimize_execution", RecommendationPriority::Medium),
            ]
        );
        assert!(recs[2].message.starts_with("2 alternative"));
    }

    #[test]
    fn test_slow_failed_run_gets_no_optimization_hint() {
        let recs = build_recommendations(
            &planning(0.9, &[], 0),
            &execution(ExecutionStatus::Failed, 50_000),
            &OrchestratorConfig::default(),
        );
        assert!(recs.is_empty());
    }
}
