//! Aggregate - Combining batches of tool results
//!
//! Three strategies are supported:
//! - `merge`: union of successful outputs, keys prefixed with the tool name
//! - `collect`: one entry per result, input order preserved
//! - `reduce`: summary, performance and error blocks plus key outputs

use crate::error::Error;
use crate::invocation::ToolResult;
use crate::JsonMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Output keys checked, in order, when reducing results to a key output
const KEY_OUTPUT_FIELDS: [&str; 4] = ["result", "output", "data", "response"];

/// How a batch of results is combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationStrategy {
    /// Prefixed union of successful outputs
    #[default]
    Merge,
    /// Per-result list
    Collect,
    /// Summary statistics
    Reduce,
}

impl AggregationStrategy {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Collect => "collect",
            Self::Reduce => "reduce",
        }
    }
}

impl std::fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AggregationStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "collect" => Ok(Self::Collect),
            "reduce" => Ok(Self::Reduce),
            other => Err(Error::InvalidInput(format!("unknown aggregation strategy '{}'", other))),
        }
    }
}

/// Combine `results` under `strategy`
#[must_use]
pub fn aggregate_results(results: &[ToolResult], strategy: AggregationStrategy) -> Value {
    let successful = results.iter().filter(|r| r.success).count();
    let metadata = json!({
        "total_tools": results.len(),
        "successful_tools": successful,
        "failed_tools": results.len() - successful,
    });

    match strategy {
        AggregationStrategy::Merge => {
            let mut merged = JsonMap::new();
            for result in results.iter().filter(|r| r.success) {
                for (key, value) in &result.data {
                    merged.insert(format!("{}_{}", result.tool_name, key), value.clone());
                }
            }
            json!({
                "strategy": strategy,
                "data": merged,
                "metadata": metadata,
            })
        }
        AggregationStrategy::Collect => {
            let collected: Vec<Value> = results
                .iter()
                .map(|r| {
                    json!({
                        "tool_name": r.tool_name,
                        "success": r.success,
                        "data": r.data,
                        "error": r.error,
                        "execution_time_ms": r.execution_time_ms,
                    })
                })
                .collect();
            json!({
                "strategy": strategy,
                "results": collected,
                "metadata": metadata,
            })
        }
        AggregationStrategy::Reduce => reduce(results, successful, metadata),
    }
}

fn reduce(results: &[ToolResult], successful: usize, metadata: Value) -> Value {
    let total = results.len();
    let success_rate = if total == 0 {
        0.0
    } else {
        successful as f64 / total as f64
    };

    let fastest = results.iter().min_by_key(|r| r.execution_time_ms);
    let slowest = results.iter().max_by_key(|r| r.execution_time_ms);
    let total_time: u64 = results.iter().map(|r| r.execution_time_ms).sum();

    let errors: Vec<Value> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| json!({ "tool": r.tool_name, "error": r.error }))
        .collect();

    let mut key_outputs = JsonMap::new();
    for result in results.iter().filter(|r| r.success) {
        if let Some(value) = KEY_OUTPUT_FIELDS.iter().find_map(|k| result.data.get(*k)) {
            key_outputs.insert(result.tool_name.clone(), value.clone());
        }
    }

    json!({
        "strategy": AggregationStrategy::Reduce,
        "summary": {
            "total": total,
            "successful": successful,
            "failed": total - successful,
            "success_rate": success_rate,
        },
        "performance": {
            "fastest_tool": fastest.map(|r| r.tool_name.clone()),
            "fastest_time_ms": fastest.map(|r| r.execution_time_ms),
            "slowest_tool": slowest.map(|r| r.tool_name.clone()),
            "slowest_time_ms": slowest.map(|r| r.execution_time_ms),
            "total_execution_time_ms": total_time,
        },
        "errors": errors,
        "key_outputs": key_outputs,
        "metadata": metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap_or_default()
    }

    fn sample() -> Vec<ToolResult> {
        vec![
            ToolResult::success("calendar", "i1", data(json!({"slots": 3, "result": "ok"})), 40),
            ToolResult::success("mailer", "i2", data(json!({"sent": true})), 15),
            ToolResult::failure("optimizer", "i3", "model offline", 90),
        ]
    }

    #[test]
    fn test_merge() {
        let merged = aggregate_results(&sample(), AggregationStrategy::Merge);
        let keys: Vec<&String> = merged["data"].as_object().unwrap().keys().collect();

        assert_eq!(keys.len(), 3);
        assert_eq!(merged["data"]["calendar_slots"], json!(3));
        assert_eq!(merged["data"]["calendar_result"], json!("ok"));
        assert_eq!(merged["data"]["mailer_sent"], json!(true));
        assert_eq!(merged["metadata"]["failed_tools"], json!(1));
    }

    #[test]
    fn test_collect_preserves_order() {
        let collected = aggregate_results(&sample(), AggregationStrategy::Collect);
        let entries = collected["results"].as_array().unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["tool_name"], json!("calendar"));
        assert_eq!(entries[2]["success"], json!(false));
        assert_eq!(entries[2]["error"], json!("model offline"));
    }

    #[test]
    fn test_reduce() {
        let reduced = aggregate_results(&sample(), AggregationStrategy::Reduce);

        assert_eq!(reduced["summary"]["successful"], json!(2));
        assert_eq!(reduced["performance"]["fastest_tool"], json!("mailer"));
        assert_eq!(reduced["performance"]["slowest_tool"], json!("optimizer"));
        assert_eq!(reduced["errors"][0]["tool"], json!("optimizer"));
        assert_eq!(reduced["key_outputs"]["calendar"], json!("ok"));
        assert!(reduced["key_outputs"].get("mailer").is_none());
    }

    #[test]
    fn test_reduce_empty() {
        let reduced = aggregate_results(&[], AggregationStrategy::Reduce);
        assert_eq!(reduced["summary"]["success_rate"], json!(0.0));
        assert!(reduced["performance"]["fastest_tool"].is_null());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("REDUCE".parse::<AggregationStrategy>().unwrap(), AggregationStrategy::Reduce);
        assert!("sum".parse::<AggregationStrategy>().is_err());
    }
}
