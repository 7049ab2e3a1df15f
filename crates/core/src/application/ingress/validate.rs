// Ingress payload validation

use crate::application::worker::constants::MAX_PAYLOAD_DEPTH;
use crate::error::{AppError, Result};
use serde_json::Value;

/// Accept only JSON objects of bounded depth
pub fn validate_payload(payload: &Value) -> Result<()> {
    if !payload.is_object() {
        return Err(AppError::Validation(format!(
            "payload must be a JSON object, got {}",
            kind(payload)
        )));
    }

    if depth(payload) > MAX_PAYLOAD_DEPTH {
        return Err(AppError::Validation(format!(
            "payload is too deeply nested (max depth {})",
            MAX_PAYLOAD_DEPTH
        )));
    }

    Ok(())
}

fn depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
