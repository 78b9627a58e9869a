/// Every failure an adapter operation can report.
///
/// Rejections by the remote store are folded into the `*Failed` kind of the
/// operation that was attempted. Transport failures stay `Http`.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Upload of {path} failed: {reason}")]
    UploadFailed { path: String, reason: String },
    #[error("Rename {from} -> {to} failed: {reason}")]
    RenameFailed {
        from: String,
        to: String,
        reason: String,
    },
    #[error("Copy {from} -> {to} failed: {reason}")]
    CopyFailed {
        from: String,
        to: String,
        reason: String,
    },
    #[error("Delete of {path} failed: {reason}")]
    DeleteFailed { path: String, reason: String },
    #[error("Invalid timestamp {value:?} on {path}")]
    InvalidTimestamp { path: String, value: String },
    #[error("Remote error: HTTP {status} - {message}")]
    Remote { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdapterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdapterError::NotFound(_))
    }

    /// Human-readable reason used when a remote rejection is re-labelled as
    /// an operation failure.
    pub fn reason(&self) -> String {
        match self {
            AdapterError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
