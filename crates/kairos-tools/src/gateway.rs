//! Gateway - Tool invocation engine
//!
//! This module provides the execution path for every tool call:
//! - Schema validation before execution (never retried)
//! - Bounded, immediate retries with a per-attempt deadline
//! - Cancellation of in-flight invocations
//! - A per-invocation audit trail mirrored to an [`AuditSink`]
//! - Bounded history of finalized invocations

use crate::aggregate::{aggregate_results, AggregationStrategy};
use crate::audit::{AuditQuery, AuditRecord, AuditSink, MemoryAuditSink};
use crate::error::{Error, Result};
use crate::invocation::{AuditEntry, InvocationSnapshot, InvocationStatus, ToolInvocation, ToolResult};
use crate::registry::{Tool, ToolRegistry};
use crate::schema::{ToolSchema, ValidationLevel};
use crate::validation::{validate_inputs, validate_outputs};
use crate::JsonMap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Configuration for the tool gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Finalized invocations kept for status/audit queries
    pub history_capacity: usize,
    /// Records kept by the default in-memory audit sink
    pub audit_capacity: usize,
    /// Whether successful outputs are checked against the schema
    pub validate_outputs: bool,
    /// Upper bound applied to every schema timeout
    pub max_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            audit_capacity: 10_000,
            validate_outputs: true,
            max_timeout_ms: 300_000,
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history capacity
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set the audit capacity
    #[must_use]
    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    /// Enable or disable output validation
    #[must_use]
    pub fn with_output_validation(mut self, enabled: bool) -> Self {
        self.validate_outputs = enabled;
        self
    }

    /// Set the maximum timeout
    #[must_use]
    pub fn with_max_timeout(mut self, max_timeout: Duration) -> Self {
        self.max_timeout_ms = max_timeout.as_millis() as u64;
        self
    }
}

/// One call of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallSpec {
    /// Tool to invoke
    pub tool_name: String,
    /// Inputs
    #[serde(default)]
    pub inputs: JsonMap,
    /// Caller-chosen invocation ID
    #[serde(default)]
    pub invocation_id: Option<String>,
    /// Validation level override
    #[serde(default)]
    pub validation_level: Option<ValidationLevel>,
}

impl ToolCallSpec {
    /// Create a call spec
    #[must_use]
    pub fn new(tool_name: impl Into<String>, inputs: JsonMap) -> Self {
        Self {
            tool_name: tool_name.into(),
            inputs,
            invocation_id: None,
            validation_level: None,
        }
    }

    /// Set the invocation ID
    #[must_use]
    pub fn with_invocation_id(mut self, id: impl Into<String>) -> Self {
        self.invocation_id = Some(id.into());
        self
    }

    /// Override the validation level
    #[must_use]
    pub fn with_validation_level(mut self, level: ValidationLevel) -> Self {
        self.validation_level = Some(level);
        self
    }
}

/// Counters over registered tools and finalized invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GatewayStats {
    /// Registered tools
    pub registered_tools: usize,
    /// Invocations in flight
    pub active_invocations: usize,
    /// Invocations retained in history
    pub history_size: usize,
    /// Successful invocations in history
    pub succeeded: usize,
    /// Failed invocations in history
    pub failed: usize,
    /// Timed-out invocations in history
    pub timed_out: usize,
    /// Cancelled invocations in history
    pub cancelled: usize,
}

struct ActiveInvocation {
    invocation: ToolInvocation,
    cancel: CancellationToken,
}

enum AttemptOutcome {
    Success(JsonMap),
    Failed(String),
    TimedOut,
    Cancelled,
}

/// Tool invocation gateway
pub struct ToolGateway {
    registry: ToolRegistry,
    active: DashMap<String, ActiveInvocation>,
    history: Mutex<VecDeque<ToolInvocation>>,
    audit_sink: Arc<dyn AuditSink>,
    config: GatewayConfig,
}

impl Default for ToolGateway {
    fn default() -> Self {
        Self::new(GatewayConfig::default())
    }
}

impl ToolGateway {
    /// Create a gateway with an in-memory audit sink
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let audit_sink: Arc<dyn AuditSink> = Arc::new(MemoryAuditSink::new(config.audit_capacity));
        Self {
            registry: ToolRegistry::new(),
            active: DashMap::new(),
            history: Mutex::new(VecDeque::new()),
            audit_sink,
            config,
        }
    }

    /// Replace the audit sink
    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = sink;
        self
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the registry
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Bind a tool to a name and schema. Re-registration overwrites.
    pub fn register_tool(&self, name: &str, tool: Arc<dyn Tool>, schema: ToolSchema) -> Result<()> {
        let details = json!({
            "timeout_ms": schema.timeout_ms,
            "max_retries": schema.max_retries,
            "validation_level": schema.validation_level,
            "required_inputs": schema.required_inputs,
        });
        let replaced = self.registry.register(name, tool, schema)?;

        self.audit_sink.record(AuditRecord::for_tool(
            name,
            AuditEntry::new(if replaced { "tool_replaced" } else { "tool_registered" }, details),
        ));
        info!(tool = %name, replaced = replaced, "Tool registered");
        Ok(())
    }

    /// Invoke a tool. Never returns an error: every failure is a failed
    /// [`ToolResult`].
    #[instrument(skip(self, inputs, invocation_id, validation_level), fields(tool = %tool_name))]
    pub async fn invoke_tool(
        &self,
        tool_name: &str,
        inputs: JsonMap,
        invocation_id: Option<String>,
        validation_level: Option<ValidationLevel>,
    ) -> ToolResult {
        let start = Instant::now();
        let invocation_id = invocation_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let Some(registered) = self.registry.get(tool_name) else {
            warn!(tool = %tool_name, invocation_id = %invocation_id, "Tool not registered");
            self.audit_sink.record(AuditRecord::for_invocation(
                tool_name,
                &invocation_id,
                AuditEntry::new("tool_not_found", json!({})),
            ));
            return ToolResult::failure(
                tool_name,
                &invocation_id,
                Error::NotFound(tool_name.to_string()).to_string(),
                elapsed_ms(start),
            )
            .with_validation_passed(false);
        };

        let schema = Arc::clone(&registered.schema);
        let level = validation_level.unwrap_or(schema.validation_level);
        let cancel = CancellationToken::new();

        match self.active.entry(invocation_id.clone()) {
            Entry::Occupied(_) => {
                warn!(tool = %tool_name, invocation_id = %invocation_id, "Invocation id already active");
                self.audit_sink.record(AuditRecord::for_invocation(
                    tool_name,
                    &invocation_id,
                    AuditEntry::new("duplicate_invocation_rejected", json!({})),
                ));
                return ToolResult::failure(
                    tool_name,
                    &invocation_id,
                    Error::InvalidInput(format!("invocation id '{}' is already active", invocation_id))
                        .to_string(),
                    elapsed_ms(start),
                );
            }
            Entry::Vacant(slot) => {
                let mut invocation = ToolInvocation::new(&invocation_id, tool_name, inputs.clone());
                self.append_audit(
                    &mut invocation,
                    "invocation_created",
                    json!({ "validation_level": level }),
                );
                slot.insert(ActiveInvocation {
                    invocation,
                    cancel: cancel.clone(),
                });
            }
        }

        // Validation failures are never retried
        let validation_errors = validate_inputs(&schema, &inputs, level);
        if !validation_errors.is_empty() {
            debug!(
                tool = %tool_name,
                errors = ?validation_errors,
                "Input validation failed"
            );
            self.with_active(&invocation_id, |gateway, inv| {
                inv.validation_errors = validation_errors.clone();
                gateway.append_audit(inv, "validation_failed", json!({ "errors": validation_errors }));
            });
            let result = ToolResult::failure(
                tool_name,
                &invocation_id,
                format!("input validation failed: {}", validation_errors.join("; ")),
                elapsed_ms(start),
            )
            .with_validation_passed(false)
            .with_metadata("validation_errors", json!(validation_errors))
            .with_metadata("validation_level", json!(level));
            self.finalize(&invocation_id, InvocationStatus::Failed, &result);
            return result;
        }

        self.with_active(&invocation_id, |gateway, inv| {
            inv.mark_running();
            gateway.append_audit(inv, "validation_passed", json!({ "validation_level": level }));
        });

        let timeout_ms = schema.timeout_ms.min(self.config.max_timeout_ms);
        let max_attempts = schema.max_retries.saturating_add(1);
        let mut attempts = 0;
        let mut output = None;
        let mut last_error = String::new();
        let mut status = InvocationStatus::Failed;

        for attempt in 1..=max_attempts {
            attempts = attempt;
            self.with_active(&invocation_id, |gateway, inv| {
                inv.retry_count = attempt - 1;
                gateway.append_audit(inv, "attempt_started", json!({ "attempt": attempt }));
            });

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => AttemptOutcome::Cancelled,
                res = tokio::time::timeout(
                    Duration::from_millis(timeout_ms),
                    registered.tool.call(inputs.clone()),
                ) => match res {
                    Ok(Ok(data)) => AttemptOutcome::Success(data),
                    Ok(Err(e)) => AttemptOutcome::Failed(e.to_string()),
                    Err(_) => AttemptOutcome::TimedOut,
                },
            };

            match outcome {
                AttemptOutcome::Success(data) => {
                    self.with_active(&invocation_id, |gateway, inv| {
                        gateway.append_audit(inv, "attempt_succeeded", json!({ "attempt": attempt }));
                    });
                    status = InvocationStatus::Success;
                    output = Some(data);
                    break;
                }
                AttemptOutcome::Failed(message) => {
                    warn!(
                        tool = %tool_name,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %message,
                        "Tool attempt failed"
                    );
                    self.with_active(&invocation_id, |gateway, inv| {
                        gateway.append_audit(
                            inv,
                            "attempt_failed",
                            json!({ "attempt": attempt, "error": message }),
                        );
                    });
                    last_error = message;
                    status = InvocationStatus::Failed;
                }
                AttemptOutcome::TimedOut => {
                    warn!(
                        tool = %tool_name,
                        attempt = attempt,
                        timeout_ms = timeout_ms,
                        "Tool attempt timed out"
                    );
                    self.with_active(&invocation_id, |gateway, inv| {
                        gateway.append_audit(
                            inv,
                            "attempt_timed_out",
                            json!({ "attempt": attempt, "timeout_ms": timeout_ms }),
                        );
                    });
                    last_error = Error::Timeout(timeout_ms).to_string();
                    status = InvocationStatus::Timeout;
                }
                AttemptOutcome::Cancelled => {
                    info!(tool = %tool_name, invocation_id = %invocation_id, "Invocation cancelled");
                    self.with_active(&invocation_id, |gateway, inv| {
                        gateway.append_audit(inv, "invocation_cancelled", json!({ "attempt": attempt }));
                    });
                    last_error = Error::Cancelled(invocation_id.clone()).to_string();
                    status = InvocationStatus::Cancelled;
                    break;
                }
            }
        }

        let retry_count = attempts.saturating_sub(1);
        let elapsed = elapsed_ms(start);
        let result = match output {
            Some(data) => {
                let warnings = if self.config.validate_outputs {
                    validate_outputs(&schema, &data, level)
                } else {
                    Vec::new()
                };
                let mut result = ToolResult::success(tool_name, &invocation_id, data, elapsed)
                    .with_retry_count(retry_count);
                if !warnings.is_empty() {
                    debug!(tool = %tool_name, warnings = ?warnings, "Output validation warnings");
                    result = result.with_metadata("output_validation_warnings", json!(warnings));
                }
                result
            }
            None => ToolResult::failure(tool_name, &invocation_id, last_error, elapsed)
                .with_retry_count(retry_count),
        }
        .with_metadata("attempts", json!(attempts))
        .with_metadata("timeout_ms", json!(timeout_ms))
        .with_metadata("validation_level", json!(level));

        debug!(
            tool = %tool_name,
            success = %result.success,
            attempts = attempts,
            execution_time_ms = elapsed,
            "Tool invocation completed"
        );

        self.finalize(&invocation_id, status, &result);
        result
    }

    /// Invoke several tools. Results are returned in input order.
    ///
    /// With `parallel` the calls run concurrently; with `fail_fast` the list
    /// ends at the first failed result.
    #[instrument(skip(self, specs), fields(count = specs.len()))]
    pub async fn invoke_tools_batch(
        &self,
        specs: Vec<ToolCallSpec>,
        parallel: bool,
        fail_fast: bool,
    ) -> Vec<ToolResult> {
        let batch_id = Uuid::new_v4().to_string();
        self.audit_sink.record(AuditRecord::global(AuditEntry::new(
            "batch_started",
            json!({
                "batch_id": batch_id,
                "size": specs.len(),
                "parallel": parallel,
                "fail_fast": fail_fast,
            }),
        )));

        let results = if parallel {
            let calls = specs.into_iter().map(|spec| {
                let ToolCallSpec {
                    tool_name,
                    inputs,
                    invocation_id,
                    validation_level,
                } = spec;
                async move {
                    self.invoke_tool(&tool_name, inputs, invocation_id, validation_level)
                        .await
                }
            });
            let mut results = futures::future::join_all(calls).await;
            if fail_fast {
                if let Some(pos) = results.iter().position(|r| !r.success) {
                    results.truncate(pos + 1);
                }
            }
            results
        } else {
            let mut results = Vec::with_capacity(specs.len());
            for spec in specs {
                let result = self
                    .invoke_tool(&spec.tool_name, spec.inputs, spec.invocation_id, spec.validation_level)
                    .await;
                let should_stop = fail_fast && !result.success;
                results.push(result);
                if should_stop {
                    debug!(batch_id = %batch_id, "Batch stopped after failure");
                    break;
                }
            }
            results
        };

        let failed = results.iter().filter(|r| !r.success).count();
        self.audit_sink.record(AuditRecord::global(AuditEntry::new(
            "batch_completed",
            json!({
                "batch_id": batch_id,
                "executed": results.len(),
                "failed": failed,
            }),
        )));
        results
    }

    /// Aggregate a batch of results
    #[must_use]
    pub fn aggregate_results(&self, results: &[ToolResult], strategy: AggregationStrategy) -> serde_json::Value {
        debug!(count = results.len(), strategy = %strategy, "Aggregating tool results");
        aggregate_results(results, strategy)
    }

    /// Cancel an in-flight invocation
    pub fn cancel_invocation(&self, invocation_id: &str) -> bool {
        match self.active.get(invocation_id) {
            Some(active) => {
                active.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Status of an invocation (active first, then history)
    #[must_use]
    pub fn get_invocation_status(&self, invocation_id: &str) -> Option<InvocationSnapshot> {
        if let Some(active) = self.active.get(invocation_id) {
            return Some(active.invocation.snapshot());
        }
        self.find_in_history(invocation_id, ToolInvocation::snapshot)
    }

    /// Audit trail of an invocation (active first, then history)
    #[must_use]
    pub fn get_audit_trail(&self, invocation_id: &str) -> Option<Vec<AuditEntry>> {
        if let Some(active) = self.active.get(invocation_id) {
            return Some(active.invocation.audit_trail.clone());
        }
        self.find_in_history(invocation_id, |inv| inv.audit_trail.clone())
    }

    /// Query the audit sink
    #[must_use]
    pub fn query_audit(&self, query: &AuditQuery) -> Vec<AuditRecord> {
        self.audit_sink.query(query)
    }

    /// Most recent finalized invocations, newest first
    #[must_use]
    pub fn recent_invocations(&self, limit: usize) -> Vec<InvocationSnapshot> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.iter().rev().take(limit).map(ToolInvocation::snapshot).collect()
    }

    /// Gateway counters
    #[must_use]
    pub fn stats(&self) -> GatewayStats {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stats = GatewayStats {
            registered_tools: self.registry.len(),
            active_invocations: self.active.len(),
            history_size: history.len(),
            ..Default::default()
        };
        for inv in history.iter() {
            match inv.status {
                InvocationStatus::Success => stats.succeeded += 1,
                InvocationStatus::Failed => stats.failed += 1,
                InvocationStatus::Timeout => stats.timed_out += 1,
                InvocationStatus::Cancelled => stats.cancelled += 1,
                InvocationStatus::Pending | InvocationStatus::Running => {}
            }
        }
        stats
    }

    fn find_in_history<T>(&self, invocation_id: &str, f: impl Fn(&ToolInvocation) -> T) -> Option<T> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history
            .iter()
            .rev()
            .find(|inv| inv.invocation_id == invocation_id)
            .map(f)
    }

    fn with_active(&self, invocation_id: &str, f: impl FnOnce(&Self, &mut ToolInvocation)) {
        if let Some(mut active) = self.active.get_mut(invocation_id) {
            f(self, &mut active.invocation);
        }
    }

    fn append_audit(&self, invocation: &mut ToolInvocation, action: &str, details: serde_json::Value) {
        let entry = AuditEntry::new(action, details);
        self.audit_sink.record(AuditRecord::for_invocation(
            &invocation.tool_name,
            &invocation.invocation_id,
            entry.clone(),
        ));
        invocation.audit_trail.push(entry);
    }

    fn finalize(&self, invocation_id: &str, status: InvocationStatus, result: &ToolResult) {
        let Some((_, active)) = self.active.remove(invocation_id) else {
            return;
        };
        let mut invocation = active.invocation;
        invocation.retry_count = result.retry_count;
        invocation.finish(status);
        self.append_audit(
            &mut invocation,
            "invocation_completed",
            json!({
                "status": status,
                "success": result.success,
                "execution_time_ms": result.execution_time_ms,
                "retry_count": result.retry_count,
                "error": result.error,
            }),
        );

        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        while history.len() >= self.config.history_capacity.max(1) {
            history.pop_front();
        }
        history.push_back(invocation);
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
