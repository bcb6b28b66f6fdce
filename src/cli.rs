//! CLI module for Kairos
//!
//! Provides commands:
//! - `plan`: score candidate plans for a task without executing anything
//! - `schedule`: route, plan and execute a task
//! - `order`: dependency-order a list of steps read from JSON
//! - `config`: print the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kairos_core::{
    ExecutionOrchestrator, ExecutionStep, PlanningStrategy, ScenarioPlanner, SimulatedStepExecutor,
    TaskType,
};
use kairos_tools::ToolGateway;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Kairos scheduling agent CLI
#[derive(Parser, Debug)]
#[command(name = "kairos")]
#[command(about = "Scheduling agent execution core")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan a task and print the planning result
    Plan {
        /// Task type, e.g. schedule_meeting
        task: TaskType,
        /// Request JSON, or @path to a JSON file
        #[arg(long, default_value = "{}")]
        request: String,
        /// User preferences JSON, or @path
        #[arg(long)]
        preferences: Option<String>,
        /// Planning strategy
        #[arg(long)]
        strategy: Option<PlanningStrategy>,
    },
    /// Route, plan and execute a task
    Schedule {
        /// Task type, e.g. schedule_meeting
        task: TaskType,
        /// Request JSON, or @path to a JSON file
        #[arg(long, default_value = "{}")]
        request: String,
        /// Requesting user
        #[arg(long, default_value = "cli")]
        user: String,
        /// User preferences JSON, or @path
        #[arg(long)]
        preferences: Option<String>,
        /// Planning strategy
        #[arg(long)]
        strategy: Option<PlanningStrategy>,
        /// Use the simulated executor instead of gateway tools
        #[arg(long)]
        simulate: bool,
    },
    /// Order steps (JSON array, or @path) by their dependencies
    Order {
        /// Steps JSON, or @path to a JSON file
        steps: String,
    },
    /// Print the effective configuration
    Config,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Plan {
            task,
            request,
            preferences,
            strategy,
        }) => plan(task, &request, preferences.as_deref(), strategy),
        Some(Commands::Schedule {
            task,
            request,
            user,
            preferences,
            strategy,
            simulate,
        }) => schedule(task, &request, &user, preferences.as_deref(), strategy, simulate).await,
        Some(Commands::Order { steps }) => order(&steps),
        Some(Commands::Config) => print_json(&crate::config::load_config()?),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn plan(
    task: TaskType,
    request: &str,
    preferences: Option<&str>,
    strategy: Option<PlanningStrategy>,
) -> Result<()> {
    let config = crate::config::load_config()?;
    let strategy = strategy.unwrap_or(config.orchestrator.default_strategy);
    let planner = ScenarioPlanner::new(config.planner);

    let request = read_json(request)?;
    let preferences = preferences.map(read_json).transpose()?.unwrap_or_else(|| json!({}));
    let scenario = planner.create_planning_scenario(task, &request, &preferences);
    let result = planner.plan_complex_scenario(&scenario, strategy)?;

    info!(
        scenario_id = %result.scenario_id,
        strategy = %strategy,
        confidence = result.confidence_score,
        "Plan ready"
    );
    print_json(&json!({ "scenario": scenario, "result": result }))
}

async fn schedule(
    task: TaskType,
    request: &str,
    user: &str,
    preferences: Option<&str>,
    strategy: Option<PlanningStrategy>,
    simulate: bool,
) -> Result<()> {
    let config = crate::config::load_config()?;
    let gateway = Arc::new(ToolGateway::new(config.gateway.clone()));
    let mut orchestrator = ExecutionOrchestrator::from_config(&config, gateway);
    if simulate {
        orchestrator = orchestrator.with_executor(Arc::new(SimulatedStepExecutor));
    } else {
        // the binary registers no tools; every step reports the missing tool
        warn!("No tools are registered; run with --simulate for a dry run");
    }

    let request = read_json(request)?;
    let preferences = preferences.map(read_json).transpose()?;
    let outcome = orchestrator
        .execute_intelligent_scheduling(task, &request, user, preferences.as_ref(), strategy)
        .await?;

    orchestrator.cleanup_execution(&outcome.execution_id);
    print_json(&outcome)
}

fn order(steps: &str) -> Result<()> {
    let config = crate::config::load_config()?;
    let planner = ScenarioPlanner::new(config.planner);

    let steps: Vec<ExecutionStep> =
        serde_json::from_value(read_json(steps)?).context("Steps must be a JSON array of steps")?;
    let ordered = planner.optimize_execution_order(&steps, &[])?;
    print_json(&ordered)
}

/// Parse inline JSON, or the contents of a file when prefixed with `@`
fn read_json(input: &str) -> Result<Value> {
    let text = match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?,
        None => input.to_string(),
    };
    serde_json::from_str(&text).context("Invalid JSON input")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schedule_command() {
        let cli = Cli::try_parse_from([
            "kairos",
            "schedule",
            "schedule_meeting",
            "--request",
            r#"{"attendees": ["a@example.com"]}"#,
            "--strategy",
            "greedy",
            "--simulate",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Schedule {
                task,
                user,
                strategy,
                simulate,
                ..
            }) => {
                assert!(simulate);
                assert_eq!(task, TaskType::ScheduleMeeting);
                assert_eq!(user, "cli");
                assert_eq!(strategy, Some(PlanningStrategy::Greedy));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_task_is_rejected() {
        assert!(Cli::try_parse_from(["kairos", "plan", "book_flight"]).is_err());
    }

    #[test]
    fn test_read_json_inline() {
        assert_eq!(read_json(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert!(read_json("not json").is_err());
        assert!(read_json("@/nonexistent/kairos.json").is_err());
    }
}
