//! Remote resource records and their normalization into [`FileMetadata`].

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use assetfs_common::error::{AdapterError, Result};
use assetfs_common::metadata::{EntryKind, FileMetadata};

/// A stored asset as the remote reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResource {
    pub public_id: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub resource_type: String,
    /// Absent for some raw uploads.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Keys replaced by their normalized counterparts.
const NORMALIZED_KEYS: [&str; 5] = ["type", "path", "size", "timestamp", "mimetype"];

/// `{resource_type}/{format}` with every `jpg` turned into `jpeg`.
pub fn mimetype(resource: &RemoteResource) -> String {
    let mimetype = format!(
        "{}/{}",
        resource.resource_type,
        resource.format.as_deref().unwrap_or_default()
    );
    mimetype.replace("jpg", "jpeg")
}

/// Creation time in Unix seconds.
pub fn timestamp(resource: &RemoteResource) -> Result<i64> {
    parse_timestamp(&resource.created_at).ok_or_else(|| AdapterError::InvalidTimestamp {
        path: resource.public_id.clone(),
        value: resource.created_at.clone(),
    })
}

fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    // Naive forms are taken as UTC
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.and_utc().timestamp())
}

pub fn normalize(resource: RemoteResource) -> Result<FileMetadata> {
    let timestamp = timestamp(&resource)?;
    let mimetype = mimetype(&resource);
    let path = resource.public_id.clone();
    let size = resource.bytes;

    let mut extra = match serde_json::to_value(&resource) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for key in NORMALIZED_KEYS {
        extra.remove(key);
    }

    Ok(FileMetadata {
        kind: EntryKind::File,
        path,
        size,
        timestamp,
        mimetype,
        extra,
    })
}
