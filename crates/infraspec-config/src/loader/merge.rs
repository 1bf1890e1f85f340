//! Deep merge of global defaults with one account's overrides.

use super::utils::join_path;
use crate::ConfigError;
use serde_json::{Map, Value};

/// Merge an account mapping over the globals, returning a new mapping.
///
/// Nested mappings merge key by key; any other value on the account side,
/// including null, replaces the global one wholesale (sequences are never
/// concatenated). A mapping on one side facing a non-mapping on the other
/// is a conflict.
pub fn merge_mappings(
    globals: &Map<String, Value>,
    account: &Map<String, Value>,
) -> Result<Map<String, Value>, ConfigError> {
    let mut merged = globals.clone();
    merge_into(&mut merged, account, "")?;
    Ok(merged)
}

fn merge_into(
    base: &mut Map<String, Value>,
    overlay: &Map<String, Value>,
    path: &str,
) -> Result<(), ConfigError> {
    for (key, value) in overlay {
        let key_path = join_path(path, key);
        match (base.get_mut(key), value) {
            (Some(Value::Object(base_map)), Value::Object(overlay_map)) => {
                merge_into(base_map, overlay_map, &key_path)?;
            }
            (Some(existing), other) if existing.is_object() || other.is_object() => {
                return Err(conflict(&key_path, existing, other));
            }
            (Some(slot), other) => {
                *slot = other.clone();
            }
            (None, other) => {
                base.insert(key.clone(), other.clone());
            }
        }
    }
    Ok(())
}

fn conflict(path: &str, existing: &Value, overlay: &Value) -> ConfigError {
    ConfigError::MergeTypeConflict {
        path: path.to_string(),
        message: format!(
            "globals hold {} but the account overrides it with {}",
            describe(existing),
            describe(overlay)
        ),
    }
}

/// Short description of a value's shape for conflict messages.
fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
