use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error::{AdapterError, Result};
use crate::metadata::FileMetadata;
use crate::options::CallOptions;

/// Readable byte stream handed to and returned from streaming operations.
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// Result of [`FilesystemAdapter::read`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReadContents {
    pub contents: Bytes,
    pub path: String,
}

/// Result of [`FilesystemAdapter::read_stream`].
pub struct ReadStream {
    pub stream: ByteReader,
    pub path: String,
}

/// Record returned by [`FilesystemAdapter::create_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRecord {
    pub path: String,
}

/// Outcome of a prefix deletion.
///
/// `partial` is set when the remote stopped before removing every match;
/// calling `delete_dir` again continues the deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteDirReport {
    pub deleted: Vec<String>,
    pub partial: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Filesystem-style contract implemented by every remote store adapter.
///
/// Paths are relative to the adapter's configured root. Each operation is a
/// single independent exchange with the remote; adapters keep no state
/// between calls beyond their immutable configuration.
#[async_trait]
pub trait FilesystemAdapter: Send + Sync {
    /// Raw response of a streamed upload, before normalization.
    type Uploaded: Send;

    /// Write `contents` to `path`, replacing anything already there.
    async fn write(&self, path: &str, contents: Bytes, options: &CallOptions)
        -> Result<FileMetadata>;

    /// Write everything readable from `stream` to `path`.
    async fn write_stream(
        &self,
        path: &str,
        stream: ByteReader,
        options: &CallOptions,
    ) -> Result<Self::Uploaded>;

    /// Stores without partial updates overwrite; this is `write`.
    async fn update(
        &self,
        path: &str,
        contents: Bytes,
        options: &CallOptions,
    ) -> Result<FileMetadata> {
        self.write(path, contents, options).await
    }

    async fn update_stream(
        &self,
        path: &str,
        stream: ByteReader,
        options: &CallOptions,
    ) -> Result<Self::Uploaded> {
        self.write_stream(path, stream, options).await
    }

    async fn rename(&self, path: &str, newpath: &str) -> Result<()>;

    async fn copy(&self, path: &str, newpath: &str) -> Result<()>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Delete every file whose path starts with `dirname`.
    async fn delete_dir(&self, dirname: &str) -> Result<DeleteDirReport>;

    async fn create_dir(&self, dirname: &str, options: &CallOptions) -> Result<DirRecord>;

    /// Whether a file exists at `path`. Absence is `Ok(false)`; only other
    /// failures are errors.
    async fn has(&self, path: &str) -> Result<bool>;

    async fn read(&self, path: &str) -> Result<ReadContents>;

    async fn read_stream(&self, path: &str) -> Result<ReadStream>;

    async fn list_contents(&self, directory: &str, recursive: bool) -> Result<Vec<FileMetadata>>;

    async fn get_metadata(&self, path: &str) -> Result<FileMetadata>;

    async fn get_size(&self, path: &str) -> Result<u64>;

    async fn get_mimetype(&self, path: &str) -> Result<String>;

    async fn get_timestamp(&self, path: &str) -> Result<i64>;

    async fn get_visibility(&self, _path: &str) -> Result<Visibility> {
        Err(AdapterError::Unsupported("visibility"))
    }

    async fn set_visibility(&self, _path: &str, _visibility: Visibility) -> Result<()> {
        Err(AdapterError::Unsupported("visibility"))
    }
}
