//! Persisted camera record
//!
//! Two keys under the configured settings group:
//! - `streams`: compact JSON array of `{"name": .., "url": ..}` stored as a string
//! - `primaryIndex`: integer, `-1` when no camera is configured

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::RegistryConfig;
use crate::error::Result;
use crate::settings::SettingsStore;

/// One camera as persisted (no runtime state)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCamera {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl StoredCamera {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Camera list plus primary index as loaded from the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredRecord {
    pub cameras: Vec<StoredCamera>,
    /// Already clamped into range; `None` iff `cameras` is empty
    pub primary: Option<usize>,
}

/// Load the record, skipping invalid entries and clamping the primary index
///
/// Never fails: malformed payloads are logged and read as an empty list.
pub fn load(store: &dyn SettingsStore, config: &RegistryConfig) -> StoredRecord {
    let group = config.settings_group.as_str();

    let cameras = match store.value(group, &config.streams_key) {
        None => Vec::new(),
        Some(Value::String(raw)) => parse_streams(&raw),
        Some(other) => {
            tracing::warn!(
                group,
                kind = value_kind(&other),
                "Camera settings payload is not a string"
            );
            Vec::new()
        }
    };

    let stored_primary = store
        .value(group, &config.primary_key)
        .and_then(|value| match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(0);

    let primary = if cameras.is_empty() {
        None
    } else {
        let max_index = (cameras.len() - 1) as i64;
        Some(stored_primary.clamp(0, max_index) as usize)
    };

    StoredRecord { cameras, primary }
}

/// Overwrite the record with `cameras` and `primary`
pub fn save(
    store: &dyn SettingsStore,
    config: &RegistryConfig,
    cameras: &[StoredCamera],
    primary: Option<usize>,
) -> Result<()> {
    let group = config.settings_group.as_str();
    let payload = serde_json::to_string(cameras)?;
    let primary = primary.map_or(-1, |index| index as i64);

    store.set_value(group, &config.streams_key, Value::String(payload))?;
    store.set_value(group, &config.primary_key, Value::from(primary))?;
    Ok(())
}

fn parse_streams(raw: &str) -> Vec<StoredCamera> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            tracing::warn!(kind = value_kind(&other), "Camera settings payload is not an array");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Camera settings payload is not valid JSON");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<StoredCamera>(item).ok())
        .filter_map(|camera| {
            let name = camera.name.trim();
            let url = camera.url.trim();
            if name.is_empty() || url.is_empty() {
                None
            } else {
                Some(StoredCamera::new(name, url))
            }
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
