//! Validation of free-form records before they are upserted.

use crate::error::{CineloadError, Result};
use serde_json::Value;

const FIELD_START_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_$";
const FIELD_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

/// Check every record is an object with an `id` or `_id` string and only
/// flat field values (strings, numbers, booleans, arrays of strings).
pub fn validate_records(records: &[Value]) -> Result<()> {
    for (i, record) in records.iter().enumerate() {
        let base = format!("records[{}]", i);

        let fields = record.as_object().ok_or_else(|| {
            CineloadError::InvalidRecord(format!(
                "{}: Expected object, received {}",
                base,
                type_name(record)
            ))
        })?;

        let ids = [fields.get("id"), fields.get("_id")];
        if !ids.iter().flatten().any(|id| id.is_string()) {
            return Err(CineloadError::InvalidRecord(match ids.iter().flatten().next() {
                Some(other) => format!(
                    "{}: Expected string identifier, received {}",
                    base,
                    type_name(other)
                ),
                None => format!("{}: A record must have an \"id\" or \"_id\" field.", base),
            }));
        }

        for (key, value) in fields {
            if !is_field_value(value) {
                return Err(CineloadError::InvalidRecord(format!(
                    "{}: Expected string | number | boolean | array of strings, received {}",
                    field_path(&base, key),
                    type_name(value)
                )));
            }
        }
    }
    Ok(())
}

fn is_field_value(value: &Value) -> bool {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => true,
        Value::Array(items) => items.iter().all(Value::is_string),
        Value::Null | Value::Object(_) => false,
    }
}

fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if FIELD_START_CHARS.contains(first) => chars.all(|c| FIELD_CHARS.contains(c)),
        _ => false,
    }
}

fn field_path(base: &str, key: &str) -> String {
    if is_field_name(key) {
        format!("{}.{}", base, key)
    } else {
        format!("{}[\"{}\"]", base, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
