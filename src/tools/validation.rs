//! Check tool call arguments against the tool's JSON Schema.

use serde_json::Value;

/// Validate `args` against an object `schema`.
///
/// Covers the subset of JSON Schema that tool parameters use: the top-level
/// type, required fields, property types, and `minLength`/`maxLength` on
/// strings (counted in characters). Returns the first violation found.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), String> {
    if schema.get("type").and_then(Value::as_str) == Some("object") && !args.is_object() {
        return Err(format!("expected object arguments, got {}", json_type_name(args)));
    }
    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        if let Some(name) = required
            .iter()
            .filter_map(Value::as_str)
            .find(|name| !obj.contains_key(*name))
        {
            return Err(format!("missing required field '{name}'"));
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in obj {
        let Some(prop) = properties.get(key) else {
            continue;
        };
        if let Some(expected) = prop.get("type").and_then(Value::as_str) {
            if !value_matches_type(value, expected) {
                return Err(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    json_type_name(value)
                ));
            }
        }
        if let Some(text) = value.as_str() {
            check_length(key, text, prop)?;
        }
    }

    Ok(())
}

fn check_length(key: &str, text: &str, prop: &Value) -> Result<(), String> {
    let len = text.chars().count() as u64;
    if let Some(min) = prop.get("minLength").and_then(Value::as_u64) {
        if len < min {
            return Err(format!("field '{key}' must be at least {min} characters, got {len}"));
        }
    }
    if let Some(max) = prop.get("maxLength").and_then(Value::as_u64) {
        if len > max {
            return Err(format!("field '{key}' must be at most {max} characters, got {len}"));
        }
    }
    Ok(())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
