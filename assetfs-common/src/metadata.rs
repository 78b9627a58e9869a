use serde::{Deserialize, Serialize};

/// Entry kind. The remote store only knows files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
}

/// Normalized metadata returned by every metadata-producing operation.
///
/// Fields the remote reported but which have no normalized counterpart are
/// kept in `extra` and serialized alongside the normalized ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: String,
    pub size: u64,
    /// Creation time, Unix seconds.
    pub timestamp: i64,
    pub mimetype: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
