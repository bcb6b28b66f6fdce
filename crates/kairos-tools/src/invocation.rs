//! Invocation records and results
//!
//! A [`ToolInvocation`] is the gateway-owned, mutable record of one call in
//! progress. A [`ToolResult`] is the immutable outcome handed back to callers.

use crate::JsonMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    /// Created, not yet validated
    Pending,
    /// Validated and executing
    Running,
    /// Finished successfully
    Success,
    /// Finished with an error
    Failed,
    /// Final attempt exceeded its deadline
    Timeout,
    /// Cancelled by the caller
    Cancelled,
}

impl InvocationStatus {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are possible
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Timeout | Self::Cancelled
        )
    }
}

impl std::fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of an invocation's audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the action happened
    pub timestamp: DateTime<Utc>,
    /// Action name (e.g. `attempt_started`)
    pub action: String,
    /// Structured details
    pub details: serde_json::Value,
}

impl AuditEntry {
    /// Create an entry stamped with the current time
    #[must_use]
    pub fn new(action: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            details,
        }
    }
}

/// Mutable record of one tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Invocation ID
    pub invocation_id: String,
    /// Tool name
    pub tool_name: String,
    /// Copy of the inputs
    pub inputs: JsonMap,
    /// Current status
    pub status: InvocationStatus,
    /// When the invocation was created
    pub created_at: DateTime<Utc>,
    /// When execution started
    pub started_at: Option<DateTime<Utc>>,
    /// When the invocation was finalized
    pub completed_at: Option<DateTime<Utc>>,
    /// Retries performed after the first attempt
    pub retry_count: u32,
    /// Input validation errors
    pub validation_errors: Vec<String>,
    /// Audit trail
    pub audit_trail: Vec<AuditEntry>,
}

impl ToolInvocation {
    /// Create a pending invocation
    #[must_use]
    pub fn new(invocation_id: impl Into<String>, tool_name: impl Into<String>, inputs: JsonMap) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            tool_name: tool_name.into(),
            inputs,
            status: InvocationStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            retry_count: 0,
            validation_errors: Vec::new(),
            audit_trail: Vec::new(),
        }
    }

    /// Move to `Running`
    pub fn mark_running(&mut self) {
        self.status = InvocationStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Move to a terminal status
    pub fn finish(&mut self, status: InvocationStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    /// Read-only view used by status queries
    #[must_use]
    pub fn snapshot(&self) -> InvocationSnapshot {
        InvocationSnapshot {
            invocation_id: self.invocation_id.clone(),
            tool_name: self.tool_name.clone(),
            status: self.status,
            retry_count: self.retry_count,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            validation_errors: self.validation_errors.clone(),
        }
    }
}

/// Status view of an invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationSnapshot {
    /// Invocation ID
    pub invocation_id: String,
    /// Tool name
    pub tool_name: String,
    /// Current status
    pub status: InvocationStatus,
    /// Retries performed
    pub retry_count: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Execution start
    pub started_at: Option<DateTime<Utc>>,
    /// Finalization time
    pub completed_at: Option<DateTime<Utc>>,
    /// Input validation errors
    pub validation_errors: Vec<String>,
}

/// Outcome of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool name
    pub tool_name: String,
    /// Invocation ID
    pub invocation_id: String,
    /// Whether execution succeeded
    pub success: bool,
    /// Output data
    pub data: JsonMap,
    /// Error message if failed
    pub error: Option<String>,
    /// Total wall time in milliseconds
    pub execution_time_ms: u64,
    /// Retries performed after the first attempt
    pub retry_count: u32,
    /// Whether input validation passed
    pub validation_passed: bool,
    /// Extra information (attempts, warnings, limits)
    pub metadata: JsonMap,
}

impl ToolResult {
    /// Create a successful result
    #[must_use]
    pub fn success(
        tool_name: impl Into<String>,
        invocation_id: impl Into<String>,
        data: JsonMap,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            invocation_id: invocation_id.into(),
            success: true,
            data,
            error: None,
            execution_time_ms,
            retry_count: 0,
            validation_passed: true,
            metadata: JsonMap::new(),
        }
    }

    /// Create a failed result
    #[must_use]
    pub fn failure(
        tool_name: impl Into<String>,
        invocation_id: impl Into<String>,
        error: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            invocation_id: invocation_id.into(),
            success: false,
            data: JsonMap::new(),
            error: Some(error.into()),
            execution_time_ms,
            retry_count: 0,
            validation_passed: true,
            metadata: JsonMap::new(),
        }
    }

    /// Set the retry count
    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Set the validation flag
    #[must_use]
    pub fn with_validation_passed(mut self, passed: bool) -> Self {
        self.validation_passed = passed;
        self
    }

    /// Attach a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
