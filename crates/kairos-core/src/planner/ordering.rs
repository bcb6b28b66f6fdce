//! Dependency-aware step ordering

use super::{PlannerError, Result};
use crate::step::ExecutionStep;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Order `steps` so every step follows its dependencies
///
/// Among ready steps the earliest in the input wins. Dependencies that name
/// no step in the list count as satisfied. When no step is ready the
/// remaining steps form a cycle: an error is returned unless
/// `tolerate_cycles`, in which case the first remaining step is forced.
pub(crate) fn order_steps(steps: &[ExecutionStep], tolerate_cycles: bool) -> Result<Vec<ExecutionStep>> {
    let known: HashSet<&str> = steps.iter().map(|s| s.step_id.as_str()).collect();
    for step in steps {
        for dependency in step.dependencies.iter().filter(|d| !known.contains(d.as_str())) {
            debug!(
                step_id = %step.step_id,
                dependency = %dependency,
                "Dependency outside the step list treated as satisfied"
            );
        }
    }

    let mut placed: HashSet<&str> = HashSet::with_capacity(steps.len());
    let mut remaining: Vec<&ExecutionStep> = steps.iter().collect();
    let mut ordered = Vec::with_capacity(steps.len());

    while !remaining.is_empty() {
        let ready = remaining.iter().position(|step| {
            step.dependencies
                .iter()
                .all(|d| placed.contains(d.as_str()) || !known.contains(d.as_str()))
        });

        let index = match ready {
            Some(index) => index,
            None if tolerate_cycles => {
                warn!(
                    step_id = %remaining[0].step_id,
                    remaining = remaining.len(),
                    "Dependency cycle detected, forcing step"
                );
                0
            }
            None => {
                return Err(PlannerError::DependencyCycle {
                    remaining: remaining.iter().map(|s| s.step_id.clone()).collect(),
                });
            }
        };

        let step = remaining.remove(index);
        placed.insert(step.step_id.as_str());
        ordered.push(step.clone());
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{StepPriority, ToolType};

    fn step(id: &str, deps: &[&str]) -> ExecutionStep {
        deps.iter().fold(
            ExecutionStep::new(id, ToolType::Analysis, StepPriority::Medium, 100),
            |s, d| s.after(*d),
        )
    }

    fn ids(steps: &[ExecutionStep]) -> Vec<&str> {
        steps.iter().map(|s| s.step_id.as_str()).collect()
    }

    #[test]
    fn test_ready_steps_keep_input_order() {
        let steps = vec![
            step("notify", &["create"]),
            step("fetch", &[]),
            step("create", &["fetch"]),
            step("log", &[]),
        ];
        let ordered = order_steps(&steps, false).unwrap();
        assert_eq!(ids(&ordered), vec!["fetch", "create", "notify", "log"]);
    }

    #[test]
    fn test_unknown_dependency_is_satisfied() {
        let steps = vec![step("update_event", &["select_best_alternative"])];
        let ordered = order_steps(&steps, false).unwrap();
        assert_eq!(ids(&ordered), vec!["update_event"]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let steps = vec![step("root", &[]), step("a", &["b"]), step("b", &["a"])];
        match order_steps(&steps, false) {
            Err(PlannerError::DependencyCycle { remaining }) => {
                assert_eq!(remaining, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_tolerated() {
        let steps = vec![step("a", &["b"]), step("b", &["a"]), step("c", &["b"])];
        let ordered = order_steps(&steps, true).unwrap();
        assert_eq!(ids(&ordered), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty() {
        assert!(order_steps(&[], false).unwrap().is_empty());
    }
}
