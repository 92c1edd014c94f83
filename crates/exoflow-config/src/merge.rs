//! Recursive merge of the user configuration over the defaults

use crate::error::{ConfigError, Result};
use serde_yaml::{Mapping, Value};

/// Merge `overriding` (user) over `overridden` (defaults).
///
/// Mappings merge key by key, and the user value wins at the leaves. A
/// mapping meeting a non-mapping at the same key is a type conflict in
/// either direction. A user `null` leaves the default in place.
pub fn deep_merge(overriding: &Value, overridden: &Value) -> Result<Value> {
    merge_at(overriding, overridden, "")
}

fn merge_at(overriding: &Value, overridden: &Value, path: &str) -> Result<Value> {
    match (overriding, overridden) {
        (Value::Null, _) => Ok(overridden.clone()),
        (_, Value::Null) => Ok(overriding.clone()),
        (Value::Mapping(user), Value::Mapping(defaults)) => {
            merge_mappings(user, defaults, path).map(Value::Mapping)
        }
        (Value::Mapping(_), _) | (_, Value::Mapping(_)) => {
            Err(ConfigError::TypeConflict(display_path(path)))
        }
        _ => Ok(overriding.clone()),
    }
}

fn merge_mappings(user: &Mapping, defaults: &Mapping, path: &str) -> Result<Mapping> {
    let mut merged = defaults.clone();
    for (key, value) in user {
        let key_path = child_path(path, key);
        let value = match defaults.get(key) {
            Some(existing) => merge_at(value, existing, &key_path)?,
            None => value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    Ok(merged)
}

fn child_path(parent: &str, key: &Value) -> String {
    let key = match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "?".to_string()),
    };
    if parent.is_empty() {
        key
    } else {
        format!("{}.{}", parent, key)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}
