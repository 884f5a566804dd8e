//! JSON snapshot normalisation
//!
//! Line diffs only line up when both sides serialise the same way, so
//! snapshots are cleaned of nulls, key-sorted at every depth and printed with
//! two-space indentation before they reach the diff engine.

use serde_json::{Map, Value};

use crate::config::SnapshotConfig;
use crate::error::Result;

/// Sort object keys lexicographically at every depth.
///
/// Arrays keep their order; their elements are sorted recursively.
pub fn sort_keys_recursive(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys_recursive(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys_recursive).collect()),
        other => other,
    }
}

/// Remove `null` object members at every depth. Array elements are kept.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key, strip_nulls(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Merge `source` into `target`.
///
/// Objects merge key by key. A key whose values are objects on both sides
/// is merged recursively, otherwise the source value replaces the target
/// value, `null` included. Keys only in `target` survive and keep their
/// position; new keys are appended.
///
/// At the top level a non-object target yields `source` and a non-object
/// source leaves `target` untouched.
pub fn merge_deep(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target), Value::Object(source)) => {
            for (key, source_value) in source {
                match target.get_mut(&key) {
                    Some(target_value) if target_value.is_object() && source_value.is_object() => {
                        let existing = std::mem::take(target_value);
                        *target_value = merge_deep(existing, source_value);
                    }
                    Some(target_value) => *target_value = source_value,
                    None => {
                        target.insert(key, source_value);
                    }
                }
            }
            Value::Object(target)
        }
        (target @ Value::Object(_), _) => target,
        (_, source) => source,
    }
}

/// Apply the configured clean-up steps
pub fn normalize(value: Value, config: &SnapshotConfig) -> Value {
    let value = if config.strip_nulls {
        strip_nulls(value)
    } else {
        value
    };
    if config.sort_keys {
        sort_keys_recursive(value)
    } else {
        value
    }
}

/// Print `{ "<wrapper_key>": [value] }` with two-space indentation and a
/// trailing newline.
pub fn to_snapshot(value: &Value, wrapper_key: &str) -> Result<String> {
    let mut wrapper = Map::new();
    wrapper.insert(wrapper_key.to_string(), Value::Array(vec![value.clone()]));
    let mut text = serde_json::to_string_pretty(&Value::Object(wrapper))?;
    text.push('\n');
    Ok(text)
}

/// Parse JSON text, normalise it and print it as a snapshot
pub fn snapshot_from_str(text: &str, config: &SnapshotConfig) -> Result<String> {
    let value: Value = serde_json::from_str(text)?;
    to_snapshot(&normalize(value, config), &config.wrapper_key)
}
