//! Registry - Tool registration and lookup
//!
//! Tools are bound to a name and a [`ToolSchema`]. The registry is shared
//! behind an `Arc` by the gateway, so registration takes `&self`.

use crate::error::{Error, Result};
use crate::schema::ToolSchema;
use crate::JsonMap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Trait for tool implementations
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Run the tool with the given inputs
    async fn call(&self, inputs: JsonMap) -> Result<JsonMap>;
}

/// Adapter turning an async closure into a [`Tool`]
pub struct FnTool<F> {
    f: F,
}

#[async_trait::async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(JsonMap) -> Fut + Send + Sync,
    Fut: Future<Output = Result<JsonMap>> + Send,
{
    async fn call(&self, inputs: JsonMap) -> Result<JsonMap> {
        (self.f)(inputs).await
    }
}

/// Wrap an async closure as a shareable tool
///
/// ```ignore
/// let tool = tool_fn(|inputs| async move { Ok(inputs) });
/// ```
pub fn tool_fn<F, Fut>(f: F) -> Arc<dyn Tool>
where
    F: Fn(JsonMap) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JsonMap>> + Send + 'static,
{
    Arc::new(FnTool { f })
}

/// A tool together with its contract
#[derive(Clone)]
pub struct RegisteredTool {
    /// Implementation
    pub tool: Arc<dyn Tool>,
    /// Declared schema
    pub schema: Arc<ToolSchema>,
    /// When the tool was (last) registered
    pub registered_at: DateTime<Utc>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("schema", &self.schema)
            .field("registered_at", &self.registered_at)
            .finish_non_exhaustive()
    }
}

/// Registry for managing tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous binding for `name`.
    ///
    /// Returns `true` when an existing tool was replaced.
    pub fn register(&self, name: &str, tool: Arc<dyn Tool>, mut schema: ToolSchema) -> Result<bool> {
        if name.trim().is_empty() {
            return Err(Error::Registration("tool name must not be empty".to_string()));
        }
        if schema.name.is_empty() {
            schema.name = name.to_string();
        } else if schema.name != name {
            return Err(Error::Registration(format!(
                "schema '{}' cannot be registered as '{}'",
                schema.name, name
            )));
        }

        debug!(tool = %name, "Registering tool");
        let replaced = self
            .tools
            .insert(
                name.to_string(),
                RegisteredTool {
                    tool,
                    schema: Arc::new(schema),
                    registered_at: Utc::now(),
                },
            )
            .is_some();
        Ok(replaced)
    }

    /// Remove a tool
    pub fn unregister(&self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<RegisteredTool> {
        self.tools.get(name).map(|entry| entry.value().clone())
    }

    /// Get a tool schema by name
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<Arc<ToolSchema>> {
        self.tools.get(name).map(|entry| Arc::clone(&entry.schema))
    }

    /// Check if a tool exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names, sorted
    #[must_use]
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Get tool count
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo() -> Arc<dyn Tool> {
        tool_fn(|inputs| async move { Ok(inputs) })
    }

    #[test]
    fn test_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());

        let replaced = registry.register("echo", echo(), ToolSchema::new("echo")).unwrap();
        assert!(!replaced);
        assert!(registry.has("echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let registry = ToolRegistry::new();
        registry
            .register("echo", echo(), ToolSchema::new("echo").with_max_retries(1))
            .unwrap();
        let replaced = registry
            .register("echo", echo(), ToolSchema::new("echo").with_max_retries(5))
            .unwrap();

        assert!(replaced);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.schema("echo").unwrap().max_retries, 5);
    }

    #[test]
    fn test_schema_name_mismatch() {
        let registry = ToolRegistry::new();
        let err = registry.register("echo", echo(), ToolSchema::new("other")).unwrap_err();
        assert!(matches!(err, Error::Registration(_)));

        registry.register("named", echo(), ToolSchema::new("")).unwrap();
        assert_eq!(registry.schema("named").unwrap().name, "named");
    }

    #[tokio::test]
    async fn test_fn_tool_call() {
        let tool = tool_fn(|mut inputs| async move {
            inputs.insert("seen".to_string(), serde_json::json!(true));
            Ok(inputs)
        });
        let out = tool.call(JsonMap::new()).await.unwrap();
        assert_eq!(out["seen"], serde_json::json!(true));
    }
}
