//! Per-call option merging.

use serde_json::{Map, Value};

use assetfs_common::CallOptions;

use crate::config::DiskConfig;

/// Key of the caller's override block inside [`CallOptions`].
pub const OVERRIDE_KEY: &str = "cloudinary";

/// The allow-listed disk fields that seed every call's options.
pub fn disk_defaults(config: &DiskConfig) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("secure".into(), Value::Bool(config.secure));
    if let Some(preset) = &config.upload_preset {
        map.insert("upload_preset".into(), Value::String(preset.clone()));
    }
    if !config.tags.is_empty() {
        map.insert(
            "tags".into(),
            Value::Array(config.tags.iter().cloned().map(Value::String).collect()),
        );
    }
    map
}

/// Disk defaults overlaid with the caller's override block. Keys from the
/// override block win.
pub fn merge_options(config: &DiskConfig, call: &CallOptions) -> Map<String, Value> {
    let mut merged = disk_defaults(config);
    merged.extend(call.remote_block(OVERRIDE_KEY));
    merged
}

/// Whether the merged options ask for https URLs. Defaults to true.
pub fn is_secure(options: &Map<String, Value>) -> bool {
    match options.get("secure") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !matches!(s.as_str(), "false" | "0" | ""),
        Some(Value::Number(n)) => n.as_i64() != Some(0),
        _ => true,
    }
}

/// Tags from merged options. Accepts an array or a comma-separated string.
pub fn merged_tags(options: &Map<String, Value>) -> Vec<String> {
    match options.get("tags") {
        Some(Value::Array(items)) => items.iter().filter_map(option_string).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Render an option value the way the remote API expects it on the wire.
pub(crate) fn option_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(option_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}
