//! Step model shared by the router, planner and orchestrator
//!
//! An [`ExecutionStep`] is a value object: producers build it once, and
//! consumers copy it freely between components.

use crate::router::RouterError;
use kairos_tools::JsonMap;
use serde::{Deserialize, Serialize};

/// High-level task the agent was asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Book a new meeting
    ScheduleMeeting,
    /// Resolve calendar conflicts
    ResolveConflict,
    /// Find free time
    FindAvailability,
    /// Move an existing meeting
    RescheduleMeeting,
    /// Cancel a meeting
    CancelMeeting,
    /// Change scheduling preferences
    UpdatePreferences,
    /// Draft a scheduling message
    GenerateCommunication,
}

impl TaskType {
    /// Every task type, in declaration order
    pub const ALL: [TaskType; 7] = [
        Self::ScheduleMeeting,
        Self::ResolveConflict,
        Self::FindAvailability,
        Self::RescheduleMeeting,
        Self::CancelMeeting,
        Self::UpdatePreferences,
        Self::GenerateCommunication,
    ];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScheduleMeeting => "schedule_meeting",
            Self::ResolveConflict => "resolve_conflict",
            Self::FindAvailability => "find_availability",
            Self::RescheduleMeeting => "reschedule_meeting",
            Self::CancelMeeting => "cancel_meeting",
            Self::UpdatePreferences => "update_preferences",
            Self::GenerateCommunication => "generate_communication",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| RouterError::UnsupportedTaskType(s.to_string()))
    }
}

/// Kind of tool a step needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    /// Calendar provider operations
    Calendar,
    /// Email composition and sending
    Email,
    /// LLM-backed reasoning
    Ai,
    /// Deterministic analysis
    Analysis,
    /// Input/plan validation
    Validation,
    /// Notifications other than email
    Notification,
    /// Preference and record storage
    Storage,
}

impl ToolType {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Email => "email",
            Self::Ai => "ai",
            Self::Analysis => "analysis",
            Self::Validation => "validation",
            Self::Notification => "notification",
            Self::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Step priority; the numeric value is used in scoring and sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPriority {
    /// 1
    Low = 1,
    /// 2
    Medium = 2,
    /// 3
    High = 3,
    /// 4
    Critical = 4,
}

impl StepPriority {
    /// Numeric weight (1-4)
    #[must_use]
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for StepPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default retry budget for a step
pub const DEFAULT_STEP_RETRIES: u32 = 3;

/// A unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Step identifier, unique within one plan
    pub step_id: String,
    /// Tool family
    pub tool_type: ToolType,
    /// Action name; also the gateway tool name
    pub action: String,
    /// Inputs passed to the tool
    #[serde(default)]
    pub inputs: JsonMap,
    /// Steps that must run before this one
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Priority
    pub priority: StepPriority,
    /// Estimated duration in milliseconds
    pub estimated_duration_ms: u64,
    /// Retries already used
    #[serde(default)]
    pub retry_count: u32,
    /// Retry budget
    #[serde(default = "default_step_retries")]
    pub max_retries: u32,
}

fn default_step_retries() -> u32 {
    DEFAULT_STEP_RETRIES
}

impl ExecutionStep {
    /// Create a step whose id equals its action
    #[must_use]
    pub fn new(action: impl Into<String>, tool_type: ToolType, priority: StepPriority, estimated_duration_ms: u64) -> Self {
        let action = action.into();
        Self {
            step_id: action.clone(),
            tool_type,
            action,
            inputs: JsonMap::new(),
            dependencies: Vec::new(),
            priority,
            estimated_duration_ms,
            retry_count: 0,
            max_retries: DEFAULT_STEP_RETRIES,
        }
    }

    /// Override the step id
    #[must_use]
    pub fn with_id(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = step_id.into();
        self
    }

    /// Add a dependency
    #[must_use]
    pub fn after(mut self, step_id: impl Into<String>) -> Self {
        self.dependencies.push(step_id.into());
        self
    }

    /// Set one input
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    /// Replace all inputs
    #[must_use]
    pub fn with_inputs(mut self, inputs: JsonMap) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the retry budget
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// De-duplication identity
    #[must_use]
    pub fn identity(&self) -> (&str, &str) {
        (&self.step_id, &self.action)
    }

    /// Whether the step may be retried
    #[must_use]
    pub fn allows_retries(&self) -> bool {
        self.max_retries > 0
    }
}
