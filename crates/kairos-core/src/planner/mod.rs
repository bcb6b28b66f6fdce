//! Scenario Planner - Multi-strategy plan generation
//!
//! The planner builds [`PlanningScenario`]s from requests, generates candidate
//! plans per [`PlanningStrategy`], ranks them and memoizes the result per
//! `(scenario_id, strategy)`. It also orders arbitrary step lists by their
//! declared dependencies.
//!
//! # Module Structure
//!
//! - `scenario`: scenario construction and integration
//! - `candidates`: candidate plans per strategy
//! - `scoring`: plan score, confidence, success rate and risks
//! - `ordering`: dependency ordering
//! - `conflicts`: planning-level conflict handling

mod candidates;
mod conflicts;
mod ordering;
mod scenario;
mod scoring;


pub use conflicts::{ConflictImpact, ImpactLevel, PlanningConflictResolution, PlanningConflictStrategy};
pub use scenario::{
    create_planning_scenario, integrate_scenarios, PlanningConstraint, PlanningScenario,
    DEFAULT_CONFLICT_TOLERANCE,
};
pub use scoring::{
    confidence_score, estimated_success_rate, optimization_metrics, risk_factors, score_plan,
    total_duration_ms, OptimizationMetrics,
};

use crate::conflict::Conflict;
use crate::step::{ExecutionStep, TaskType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Planner errors
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Strategy string did not name a known strategy
    #[error("unsupported planning strategy: {0}")]
    UnsupportedStrategy(String),

    /// Scenario values out of range
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    /// Steps whose dependencies can never be satisfied
    #[error("dependency cycle among steps: {}", remaining.join(", "))]
    DependencyCycle {
        /// Steps left unordered
        remaining: Vec<String>,
    },
}

/// Result type for planner operations
pub type Result<T> = std::result::Result<T, PlannerError>;

/// How candidate plans are generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanningStrategy {
    /// One fast plan
    Greedy,
    /// Deeper AI-driven and constraint-driven plans
    Optimal,
    /// Greedy plus optimal plans
    #[default]
    Balanced,
    /// One plan with validation and risk assessment
    Conservative,
}

impl PlanningStrategy {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::Optimal => "optimal",
            Self::Balanced => "balanced",
            Self::Conservative => "conservative",
        }
    }
}

impl std::fmt::Display for PlanningStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlanningStrategy {
    type Err = PlannerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "optimal" => Ok(Self::Optimal),
            "balanced" => Ok(Self::Balanced),
            "conservative" => Ok(Self::Conservative),
            _ => Err(PlannerError::UnsupportedStrategy(s.to_string())),
        }
    }
}

/// Output of [`ScenarioPlanner::plan_complex_scenario`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningResult {
    /// Scenario planned
    pub scenario_id: String,
    /// Strategy used
    pub strategy: PlanningStrategy,
    /// Highest-ranked plan
    pub recommended_plan: Vec<ExecutionStep>,
    /// Up to two runners-up
    pub alternative_plans: Vec<Vec<ExecutionStep>>,
    /// Confidence in [0, 1]
    pub confidence_score: f64,
    /// Success-rate estimate in [0, 1]
    pub estimated_success_rate: f64,
    /// Free-text risk flags
    pub risk_factors: Vec<String>,
    /// Metrics of the recommended plan
    pub optimization_metrics: OptimizationMetrics,
    /// Sum of the recommended plan's step durations
    pub execution_time_estimate_ms: u64,
}

/// Planner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Planning results kept in the memo cache
    pub cache_capacity: usize,
    /// Force an order through dependency cycles instead of failing
    pub tolerate_cycles: bool,
    /// Alternative plans returned with each result
    pub max_alternatives: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            tolerate_cycles: false,
            max_alternatives: 2,
        }
    }
}

impl PlannerConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache capacity
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Allow forced ordering through cycles
    #[must_use]
    pub fn with_tolerate_cycles(mut self, tolerate: bool) -> Self {
        self.tolerate_cycles = tolerate;
        self
    }
}

type CacheKey = (String, PlanningStrategy);

/// Bounded FIFO memo of planning results
#[derive(Default)]
struct PlanCache {
    entries: HashMap<CacheKey, PlanningResult>,
    order: VecDeque<CacheKey>,
}

/// Generates, ranks and orders plans
pub struct ScenarioPlanner {
    config: PlannerConfig,
    cache: Mutex<PlanCache>,
}

impl Default for ScenarioPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl ScenarioPlanner {
    /// Create a planner
    #[must_use]
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(PlanCache::default()),
        }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Build a scenario from a request and the user's preferences
    #[must_use]
    pub fn create_planning_scenario(
        &self,
        task_type: TaskType,
        request_data: &Value,
        user_preferences: &Value,
    ) -> PlanningScenario {
        let scenario = create_planning_scenario(task_type, request_data, user_preferences);
        debug!(
            scenario_id = %scenario.scenario_id,
            task_type = %task_type,
            constraints = scenario.constraints.len(),
            goals = scenario.optimization_goals.len(),
            "Planning scenario created"
        );
        scenario
    }

    /// Merge scenarios for a multi-step operation
    #[must_use]
    pub fn integrate_scenarios(&self, scenarios: &[PlanningScenario], goals: &[String]) -> PlanningScenario {
        integrate_scenarios(scenarios, goals)
    }

    /// Generate, score and rank candidate plans
    ///
    /// Results are memoized by `(scenario_id, strategy)`; a second call for
    /// the same key returns the cached result unchanged.
    #[instrument(skip(self, scenario), fields(scenario_id = %scenario.scenario_id))]
    pub fn plan_complex_scenario(&self, scenario: &PlanningScenario, strategy: PlanningStrategy) -> Result<PlanningResult> {
        let key = (scenario.scenario_id.clone(), strategy);
        if let Some(cached) = self.lock_cache().entries.get(&key) {
            debug!(strategy = %strategy, "Planning cache hit");
            return Ok(cached.clone());
        }

        scenario.validate().map_err(PlannerError::InvalidScenario)?;

        let mut candidates: Vec<(f64, Vec<ExecutionStep>)> = candidates::generate_candidates(scenario, strategy)
            .into_iter()
            .map(|plan| (score_plan(&plan), plan))
            .collect();
        // stable: equal scores keep generation order
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut ranked = candidates.into_iter().map(|(_, plan)| plan);
        let recommended_plan = ranked.next().unwrap_or_default();
        let alternative_plans: Vec<_> = ranked.take(self.config.max_alternatives).collect();

        let metrics = optimization_metrics(&recommended_plan);
        let result = PlanningResult {
            scenario_id: scenario.scenario_id.clone(),
            strategy,
            confidence_score: confidence_score(scenario, &recommended_plan),
            estimated_success_rate: estimated_success_rate(scenario, &recommended_plan),
            risk_factors: risk_factors(scenario, &recommended_plan),
            execution_time_estimate_ms: metrics.execution_time_estimate_ms,
            optimization_metrics: metrics,
            alternative_plans,
            recommended_plan,
        };

        info!(
            strategy = %strategy,
            steps = result.recommended_plan.len(),
            alternatives = result.alternative_plans.len(),
            confidence = result.confidence_score,
            "Scenario planned"
        );

        self.store(key, result.clone());
        Ok(result)
    }

    /// Order steps so that each follows its dependencies
    ///
    /// `constraints` are recorded for diagnostics; ordering depends only on
    /// the declared dependencies and the input order.
    pub fn optimize_execution_order(
        &self,
        steps: &[ExecutionStep],
        constraints: &[PlanningConstraint],
    ) -> Result<Vec<ExecutionStep>> {
        debug!(
            steps = steps.len(),
            hard_constraints = constraints.iter().filter(|c| c.is_hard).count(),
            "Ordering steps"
        );
        ordering::order_steps(steps, self.config.tolerate_cycles)
    }

    /// Analyze conflict impact and emit a resolution template
    #[must_use]
    pub fn handle_planning_conflicts(
        &self,
        scenario: &PlanningScenario,
        conflicts: &[Conflict],
    ) -> PlanningConflictResolution {
        let impact = conflicts::analyze_impact(scenario, conflicts);
        let strategy = conflicts::select_strategy(conflicts, &impact);
        let steps = conflicts::strategy_steps(strategy, &impact);

        debug!(
            scenario_id = %scenario.scenario_id,
            strategy = %strategy,
            impact = ?impact.complexity,
            "Planning conflicts handled"
        );

        PlanningConflictResolution {
            scenario_id: scenario.scenario_id.clone(),
            strategy,
            impact,
            steps,
        }
    }

    /// Number of memoized results
    #[must_use]
    pub fn cached_results(&self) -> usize {
        self.lock_cache().entries.len()
    }

    fn store(&self, key: CacheKey, result: PlanningResult) {
        if self.config.cache_capacity == 0 {
            return;
        }
        let mut cache = self.lock_cache();
        if cache.entries.insert(key.clone(), result).is_none() {
            cache.order.push_back(key);
        }
        while cache.entries.len() > self.config.cache_capacity {
            match cache.order.pop_front() {
                Some(oldest) => {
                    cache.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, PlanCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
