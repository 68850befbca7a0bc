//! Shape validator: shallow presence check of required top-level fields.

use contentagent_shared::{ContentAgentError, PayloadKind, Result, ShapeDescription};
use serde_json::{Map, Value};

/// Confirm `value` carries every required field of `shape`.
///
/// Returns the value unchanged on success. Reports only the first missing
/// field in declared order and never inspects value types or nested shape.
/// List shapes check the array length (when fixed) and each element.
pub fn validate(value: Value, shape: &ShapeDescription) -> Result<Value> {
    match shape.kind {
        PayloadKind::Object => {
            let map = value.as_object().ok_or_else(|| {
                ContentAgentError::unexpected_shape(format!(
                    "expected a JSON object, got {}",
                    type_name(&value)
                ))
            })?;
            check_fields(map, shape)?;
        }
        PayloadKind::List { exact_len } => {
            let items = value.as_array().ok_or_else(|| {
                ContentAgentError::unexpected_shape(format!(
                    "expected a JSON array, got {}",
                    type_name(&value)
                ))
            })?;

            if let Some(expected) = exact_len {
                if items.len() != expected {
                    return Err(ContentAgentError::unexpected_shape(format!(
                        "expected exactly {expected} elements, got {}",
                        items.len()
                    )));
                }
            }

            for (i, item) in items.iter().enumerate() {
                let map = item.as_object().ok_or_else(|| {
                    ContentAgentError::unexpected_shape(format!(
                        "element {} is {}, not an object",
                        i + 1,
                        type_name(item)
                    ))
                })?;
                check_fields(map, shape)?;
            }
        }
    }

    Ok(value)
}

fn check_fields(map: &Map<String, Value>, shape: &ShapeDescription) -> Result<()> {
    match shape.required_names().find(|name| !map.contains_key(*name)) {
        Some(missing) => Err(ContentAgentError::MissingRequiredField(missing.to_string())),
        None => Ok(()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
