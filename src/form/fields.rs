//! Loose-value coercion helpers for field updates.
//!
//! Field updates arrive as untyped JSON values; these helpers fold them into
//! the typed state records without ever failing. Malformed numeric codes
//! coerce to zero rather than propagating a fault.

use serde_json::Value;

/// Coerce an answer code to an integer, defaulting to 0 for anything that is
/// not a number or a numeric string.
pub fn coerce_code(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

pub fn as_opt_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn as_opt_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn as_string(value: &Value) -> String {
    as_opt_string(value).unwrap_or_default()
}

pub fn as_opt_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

pub fn as_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(as_string).collect(),
        Value::Null => Vec::new(),
        other => vec![as_string(other)],
    }
}

pub fn as_object(value: &Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_codes_coerce_to_zero() {
        assert_eq!(coerce_code(&json!(2)), 2);
        assert_eq!(coerce_code(&json!("3")), 3);
        assert_eq!(coerce_code(&json!("not a number")), 0);
        assert_eq!(coerce_code(&json!(null)), 0);
        assert_eq!(coerce_code(&json!({"a": 1})), 0);
    }

    #[test]
    fn bool_coercion_accepts_common_encodings() {
        assert_eq!(as_opt_bool(&json!(true)), Some(true));
        assert_eq!(as_opt_bool(&json!("false")), Some(false));
        assert_eq!(as_opt_bool(&json!(1)), Some(true));
        assert_eq!(as_opt_bool(&json!("yes")), None);
    }
}
