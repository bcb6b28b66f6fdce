//! Kairos Tools - Tool Invocation Gateway
//!
//! This crate provides the tool layer for the Kairos scheduling agent:
//! - Schema: Declared input/output contracts for tools
//! - Validation: Strict, moderate and lenient checking of tool payloads
//! - Registry: Tool registration and lookup
//! - Gateway: Retried, deadline-bounded invocation with an audit trail
//! - Aggregate: Merging batches of results into one view

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod audit;
pub mod error;
pub mod gateway;
pub mod invocation;
pub mod registry;
pub mod schema;
pub mod validation;

pub use aggregate::{aggregate_results, AggregationStrategy};
pub use audit::{AuditQuery, AuditRecord, AuditSink, MemoryAuditSink};
pub use error::{Error, Result, ToolInvocationError};
pub use gateway::{GatewayConfig, GatewayStats, ToolCallSpec, ToolGateway};
pub use invocation::{AuditEntry, InvocationSnapshot, InvocationStatus, ToolInvocation, ToolResult};
pub use registry::{tool_fn, FnTool, RegisteredTool, Tool, ToolRegistry};
pub use schema::{FieldSpec, FieldType, ToolSchema, ValidationLevel};

/// JSON object used for tool inputs and outputs
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
