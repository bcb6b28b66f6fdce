//! Audit - Append-only sink for gateway activity
//!
//! The gateway writes every registration, attempt, outcome and batch
//! boundary to an [`AuditSink`]. Persistence is the sink's concern; the
//! bundled [`MemoryAuditSink`] keeps a bounded window in memory.

use crate::invocation::AuditEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// An audit entry tagged with the tool and invocation it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Tool name (`None` for batch-level records)
    pub tool_name: Option<String>,
    /// Invocation ID (`None` for registration and batch records)
    pub invocation_id: Option<String>,
    /// The entry itself
    #[serde(flatten)]
    pub entry: AuditEntry,
}

impl AuditRecord {
    /// Record tied to one invocation
    #[must_use]
    pub fn for_invocation(tool_name: &str, invocation_id: &str, entry: AuditEntry) -> Self {
        Self {
            tool_name: Some(tool_name.to_string()),
            invocation_id: Some(invocation_id.to_string()),
            entry,
        }
    }

    /// Record tied to a tool but no invocation
    #[must_use]
    pub fn for_tool(tool_name: &str, entry: AuditEntry) -> Self {
        Self {
            tool_name: Some(tool_name.to_string()),
            invocation_id: None,
            entry,
        }
    }

    /// Record not tied to any tool
    #[must_use]
    pub fn global(entry: AuditEntry) -> Self {
        Self {
            tool_name: None,
            invocation_id: None,
            entry,
        }
    }
}

/// Filter for audit retrieval
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Only records for this tool
    pub tool_name: Option<String>,
    /// Only records at or after this time
    pub since: Option<DateTime<Utc>>,
    /// Only records at or before this time
    pub until: Option<DateTime<Utc>>,
    /// Return at most this many (most recent) records
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Match everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one tool
    #[must_use]
    pub fn for_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// Lower time bound (inclusive)
    #[must_use]
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Upper time bound (inclusive)
    #[must_use]
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Cap the number of records
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a record passes the filter
    #[must_use]
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(ref tool) = self.tool_name {
            if record.tool_name.as_deref() != Some(tool.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.entry.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.entry.timestamp > until {
                return false;
            }
        }
        true
    }
}

/// Destination for audit records
pub trait AuditSink: Send + Sync {
    /// Append a record
    fn record(&self, record: AuditRecord);

    /// Retrieve records matching `query`, oldest first
    fn query(&self, query: &AuditQuery) -> Vec<AuditRecord>;
}

/// Bounded in-memory audit sink
pub struct MemoryAuditSink {
    records: Mutex<VecDeque<AuditRecord>>,
    capacity: usize,
}

impl MemoryAuditSink {
    /// Create a sink keeping at most `capacity` records
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Number of retained records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no records are retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn query(&self, query: &AuditQuery) -> Vec<AuditRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let matched: Vec<AuditRecord> = records.iter().filter(|r| query.matches(r)).cloned().collect();
        match query.limit {
            Some(limit) if matched.len() > limit => matched[matched.len() - limit..].to_vec(),
            _ => matched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_query_by_tool_and_time() {
        let sink = MemoryAuditSink::new(10);
        let start = Utc::now() - Duration::seconds(1);

        sink.record(AuditRecord::for_tool("create_event", AuditEntry::new("tool_registered", json!({}))));
        sink.record(AuditRecord::for_invocation(
            "send_email",
            "inv_1",
            AuditEntry::new("attempt_started", json!({"attempt": 1})),
        ));
        sink.record(AuditRecord::global(AuditEntry::new("batch_started", json!({}))));

        let created = sink.query(&AuditQuery::new().for_tool("create_event"));
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].entry.action, "tool_registered");

        assert_eq!(sink.query(&AuditQuery::new().since(start)).len(), 3);
        assert!(sink.query(&AuditQuery::new().until(start)).is_empty());
        assert_eq!(sink.query(&AuditQuery::new().limit(2)).len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let sink = MemoryAuditSink::new(2);
        for i in 0..3 {
            sink.record(AuditRecord::global(AuditEntry::new(format!("a{}", i), json!({}))));
        }
        let all = sink.query(&AuditQuery::new());
        assert_eq!(sink.len(), 2);
        assert_eq!(all[0].entry.action, "a1");
        assert_eq!(all[1].entry.action, "a2");
    }
}
