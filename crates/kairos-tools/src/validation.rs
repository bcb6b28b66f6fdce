//! Validation - Checking tool payloads against a schema
//!
//! Input validation runs before a tool is called and short-circuits the
//! invocation on any error. Output validation runs after a successful call
//! and only produces warnings.

use crate::schema::{FieldSpec, FieldType, ToolSchema, ValidationLevel};
use crate::JsonMap;
use serde_json::Value;

/// Validate tool inputs. Returns every problem found; empty means valid.
#[must_use]
pub fn validate_inputs(schema: &ToolSchema, inputs: &JsonMap, level: ValidationLevel) -> Vec<String> {
    let mut errors = Vec::new();

    for name in &schema.required_inputs {
        match inputs.get(name) {
            None | Some(Value::Null) => errors.push(format!("missing required input '{}'", name)),
            Some(_) => {}
        }
    }

    for (name, value) in inputs {
        match schema.input_fields.get(name) {
            Some(spec) => check_field(name, value, spec, level, &mut errors),
            None if level == ValidationLevel::Strict && !schema.declares_input(name) => {
                errors.push(format!("unexpected input '{}'", name));
            }
            None => {}
        }
    }

    errors
}

/// Validate tool outputs. Returns warnings; never fails the call.
#[must_use]
pub fn validate_outputs(schema: &ToolSchema, outputs: &JsonMap, level: ValidationLevel) -> Vec<String> {
    let mut warnings = Vec::new();

    for (name, spec) in &schema.output_fields {
        match outputs.get(name) {
            Some(value) => check_field(name, value, spec, level, &mut warnings),
            None => warnings.push(format!("missing output '{}'", name)),
        }
    }

    warnings
}

fn check_field(name: &str, value: &Value, spec: &FieldSpec, level: ValidationLevel, errors: &mut Vec<String>) {
    if value.is_null() {
        return;
    }

    let type_ok = match level {
        ValidationLevel::Strict => matches_exact(spec.field_type, value),
        ValidationLevel::Moderate => is_coercible(spec.field_type, value),
        ValidationLevel::Lenient => true,
    };
    if !type_ok {
        errors.push(format!(
            "field '{}' expected {} but got {}",
            name,
            spec.field_type,
            json_type_name(value)
        ));
        return;
    }

    if let Some(len) = value_length(value) {
        if let Some(min) = spec.min_length {
            if len < min {
                errors.push(format!("field '{}' length {} is below minimum {}", name, len, min));
            }
        }
        if let Some(max) = spec.max_length {
            if len > max {
                errors.push(format!("field '{}' length {} exceeds maximum {}", name, len, max));
            }
        }
    }

    if spec.min_value.is_some() || spec.max_value.is_some() {
        if let Some(n) = numeric_value(value) {
            if let Some(min) = spec.min_value {
                if n < min {
                    errors.push(format!("field '{}' value {} is below minimum {}", name, n, min));
                }
            }
            if let Some(max) = spec.max_value {
                if n > max {
                    errors.push(format!("field '{}' value {} exceeds maximum {}", name, n, max));
                }
            }
        }
    }

    if !spec.allowed_values.is_empty() && !spec.allowed_values.contains(value) {
        errors.push(format!("field '{}' has a value outside the allowed set", name));
    }
}

fn matches_exact(field_type: FieldType, value: &Value) -> bool {
    match field_type {
        FieldType::String => value.is_string(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Array => value.is_array(),
        FieldType::Object => value.is_object(),
        FieldType::Any => true,
    }
}

fn is_coercible(field_type: FieldType, value: &Value) -> bool {
    match field_type {
        FieldType::String => value.is_string() || value.is_number() || value.is_boolean(),
        FieldType::Integer => match value {
            Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
            Value::String(s) => s.trim().parse::<i64>().is_ok(),
            _ => false,
        },
        FieldType::Number => match value {
            Value::Number(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => true,
            Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "false"),
            Value::Number(n) => matches!(n.as_i64(), Some(0) | Some(1)),
            _ => false,
        },
        FieldType::Array => value.is_array(),
        FieldType::Object => value.is_object(),
        FieldType::Any => true,
    }
}

fn value_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        Value::Object(o) => Some(o.len()),
        _ => None,
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ToolSchema {
        ToolSchema::new("create_event")
            .required_input("title", FieldSpec::string().with_min_length(1).with_max_length(20))
            .required_input("duration_minutes", FieldSpec::integer().with_range(5.0, 240.0))
            .optional_input("notify", FieldSpec::boolean())
            .optional_input(
                "visibility",
                FieldSpec::string().with_allowed_values(vec![json!("public"), json!("private")]),
            )
            .output_field("event_id", FieldSpec::string())
    }

    fn map(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_missing_required_input() {
        let errors = validate_inputs(&schema(), &map(json!({"title": "Sync"})), ValidationLevel::Lenient);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("duration_minutes"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let inputs = map(json!({"title": "Sync", "duration_minutes": null}));
        let errors = validate_inputs(&schema(), &inputs, ValidationLevel::Moderate);
        assert!(errors.iter().any(|e| e.contains("missing required input 'duration_minutes'")));
    }

    #[test]
    fn test_strict_rejects_coercible_types() {
        let inputs = map(json!({"title": "Sync", "duration_minutes": "30"}));
        let strict = validate_inputs(&schema(), &inputs, ValidationLevel::Strict);
        assert!(strict.iter().any(|e| e.contains("expected integer")));

        let moderate = validate_inputs(&schema(), &inputs, ValidationLevel::Moderate);
        assert!(moderate.is_empty(), "{:?}", moderate);
    }

    #[test]
    fn test_strict_rejects_undeclared_inputs() {
        let inputs = map(json!({"title": "Sync", "duration_minutes": 30, "room": "A"}));
        assert!(!validate_inputs(&schema(), &inputs, ValidationLevel::Strict).is_empty());
        assert!(validate_inputs(&schema(), &inputs, ValidationLevel::Moderate).is_empty());
    }

    #[test]
    fn test_moderate_rejects_uncoercible() {
        let inputs = map(json!({"title": "Sync", "duration_minutes": "half an hour"}));
        let errors = validate_inputs(&schema(), &inputs, ValidationLevel::Moderate);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_lenient_checks_constraints_only() {
        let inputs = map(json!({"title": "Sync", "duration_minutes": "600"}));
        let errors = validate_inputs(&schema(), &inputs, ValidationLevel::Lenient);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("exceeds maximum"));

        let inputs = map(json!({"title": true, "duration_minutes": 30}));
        assert!(validate_inputs(&schema(), &inputs, ValidationLevel::Lenient).is_empty());
    }

    #[test]
    fn test_length_and_allowed_values() {
        let inputs = map(json!({
            "title": "a very long meeting title indeed",
            "duration_minutes": 30,
            "visibility": "secret"
        }));
        let errors = validate_inputs(&schema(), &inputs, ValidationLevel::Moderate);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_output_warnings() {
        let warnings = validate_outputs(&schema(), &map(json!({})), ValidationLevel::Moderate);
        assert_eq!(warnings, vec!["missing output 'event_id'".to_string()]);

        let warnings = validate_outputs(&schema(), &map(json!({"event_id": "evt_1"})), ValidationLevel::Strict);
        assert!(warnings.is_empty());
    }
}
