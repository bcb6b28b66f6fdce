//! Schema - Declared contracts for tools
//!
//! Every tool is registered against a [`ToolSchema`] that names its inputs
//! and outputs, the per-field constraints, how strictly payloads are checked,
//! and the timeout/retry budget used by the gateway.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// JSON type tag of a declared field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// Whole number
    Integer,
    /// Any number
    Number,
    /// true/false
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
    /// Any JSON value
    #[default]
    Any,
}

impl FieldType {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How strictly payloads are checked against the schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Exact JSON type match, undeclared inputs rejected
    Strict,
    /// Values only need to be coercible to the declared type
    #[default]
    Moderate,
    /// Only value constraints (length, range, allowed values) are checked
    Lenient,
}

impl ValidationLevel {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Lenient => "lenient",
        }
    }
}

impl std::fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type and constraints of a single field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Declared type
    pub field_type: FieldType,
    /// Minimum length for strings, arrays and objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length for strings, arrays and objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Minimum numeric value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    /// Maximum numeric value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Closed set of accepted values (empty = any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<serde_json::Value>,
}

impl FieldSpec {
    /// Create a field of the given type with no constraints
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            ..Default::default()
        }
    }

    /// Shorthand for a string field
    #[must_use]
    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    /// Shorthand for an integer field
    #[must_use]
    pub fn integer() -> Self {
        Self::new(FieldType::Integer)
    }

    /// Shorthand for a number field
    #[must_use]
    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    /// Shorthand for a boolean field
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    /// Shorthand for an array field
    #[must_use]
    pub fn array() -> Self {
        Self::new(FieldType::Array)
    }

    /// Shorthand for an object field
    #[must_use]
    pub fn object() -> Self {
        Self::new(FieldType::Object)
    }

    /// Set the minimum length
    #[must_use]
    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Set the maximum length
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Set the accepted numeric range (inclusive)
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    /// Set the minimum numeric value
    #[must_use]
    pub fn with_min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    /// Set the maximum numeric value
    #[must_use]
    pub fn with_max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    /// Restrict the field to a closed set of values
    #[must_use]
    pub fn with_allowed_values(mut self, values: Vec<serde_json::Value>) -> Self {
        self.allowed_values = values;
        self
    }
}

/// Contract of a registered tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Declared input fields
    #[serde(default)]
    pub input_fields: BTreeMap<String, FieldSpec>,
    /// Declared output fields
    #[serde(default)]
    pub output_fields: BTreeMap<String, FieldSpec>,
    /// Inputs that must be present
    #[serde(default)]
    pub required_inputs: Vec<String>,
    /// Inputs that may be present
    #[serde(default)]
    pub optional_inputs: Vec<String>,
    /// Default validation strictness
    #[serde(default)]
    pub validation_level: ValidationLevel,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
}

impl ToolSchema {
    /// Create a schema with no declared fields
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_fields: BTreeMap::new(),
            output_fields: BTreeMap::new(),
            required_inputs: Vec::new(),
            optional_inputs: Vec::new(),
            validation_level: ValidationLevel::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare a required input
    #[must_use]
    pub fn required_input(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        let name = name.into();
        if !self.required_inputs.contains(&name) {
            self.required_inputs.push(name.clone());
        }
        self.optional_inputs.retain(|n| n != &name);
        self.input_fields.insert(name, spec);
        self
    }

    /// Declare an optional input
    #[must_use]
    pub fn optional_input(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        let name = name.into();
        if !self.optional_inputs.contains(&name) && !self.required_inputs.contains(&name) {
            self.optional_inputs.push(name.clone());
        }
        self.input_fields.insert(name, spec);
        self
    }

    /// Declare an output field
    #[must_use]
    pub fn output_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.output_fields.insert(name.into(), spec);
        self
    }

    /// Set the default validation level
    #[must_use]
    pub fn with_validation_level(mut self, level: ValidationLevel) -> Self {
        self.validation_level = level;
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the retry budget
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Per-attempt timeout as a `Duration`
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether `name` is a declared input (required or optional)
    #[must_use]
    pub fn declares_input(&self, name: &str) -> bool {
        self.input_fields.contains_key(name)
            || self.required_inputs.iter().any(|n| n == name)
            || self.optional_inputs.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder() {
        let schema = ToolSchema::new("check_availability")
            .with_description("Look up free/busy windows")
            .required_input("attendees", FieldSpec::array().with_min_length(1))
            .optional_input("duration_minutes", FieldSpec::integer().with_range(5.0, 480.0))
            .output_field("slots", FieldSpec::array())
            .with_validation_level(ValidationLevel::Strict)
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(1);

        assert_eq!(schema.required_inputs, vec!["attendees".to_string()]);
        assert_eq!(schema.optional_inputs, vec!["duration_minutes".to_string()]);
        assert_eq!(schema.timeout_ms, 5_000);
        assert_eq!(schema.max_retries, 1);
        assert!(schema.declares_input("attendees"));
        assert!(!schema.declares_input("location"));
    }

    #[test]
    fn test_required_overrides_optional() {
        let schema = ToolSchema::new("t")
            .optional_input("a", FieldSpec::string())
            .required_input("a", FieldSpec::string());

        assert_eq!(schema.required_inputs, vec!["a".to_string()]);
        assert!(schema.optional_inputs.is_empty());
    }

    #[test]
    fn test_schema_defaults() {
        let schema = ToolSchema::new("t");
        assert_eq!(schema.validation_level, ValidationLevel::Moderate);
        assert_eq!(schema.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(schema.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_validation_level_serde() {
        let level: ValidationLevel = serde_json::from_str("\"lenient\"").unwrap();
        assert_eq!(level, ValidationLevel::Lenient);
        assert_eq!(ValidationLevel::Strict.to_string(), "strict");
    }
}
