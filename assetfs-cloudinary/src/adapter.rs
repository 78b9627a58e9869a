//! Filesystem contract on top of a Cloudinary account.
//!
//! Every operation computes the effective public id (path prefix applied),
//! merges call options over the disk defaults, performs one remote call and
//! normalizes what comes back. The remote has no directories and no partial
//! updates: directories are identifier prefixes, updates are re-uploads.

use std::io::SeekFrom;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Map;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

use assetfs_common::adapter::{
    ByteReader, DeleteDirReport, DirRecord, FilesystemAdapter, ReadContents, ReadStream,
};
use assetfs_common::error::{AdapterError, Result};
use assetfs_common::path::{directory_prefixes, file_stem, prefix_path, remote_identifier};
use assetfs_common::{CallOptions, FileMetadata};

use crate::client::http::HttpClient;
use crate::client::{AssetClient, ResourcesQuery, UploadSource};
use crate::config::DiskConfig;
use crate::options::{is_secure, merge_options, merged_tags};
use crate::resource::{self, normalize, RemoteResource};

pub struct CloudinaryAdapter<C = HttpClient> {
    config: DiskConfig,
    client: C,
}

impl CloudinaryAdapter<HttpClient> {
    /// Build an adapter with its own HTTP client for `config`.
    pub fn from_config(config: DiskConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AdapterError::Config(e.to_string()))?;
        let client = HttpClient::new(&config)?;
        Ok(Self::new(config, client))
    }
}

impl<C: AssetClient> CloudinaryAdapter<C> {
    pub fn new(config: DiskConfig, client: C) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &DiskConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Remote public id for a caller path.
    pub fn effective_path(&self, path: &str) -> String {
        prefix_path(&self.config.path_prefix, path)
    }

    /// Delivery URL for `path`. The merged `secure` option picks https
    /// (the default) or plain http.
    pub fn get_url(&self, path: &str, options: &CallOptions) -> String {
        let options = merge_options(&self.config, options);
        let public_id = self.effective_path(path);
        if is_secure(&options) {
            self.client.secure_url(&public_id, &options)
        } else {
            self.client.url(&public_id, &options)
        }
    }

    /// Immediate sub-directories of `directory`, derived from the ids
    /// stored under it.
    pub async fn directories(&self, directory: &str) -> Result<Vec<String>> {
        let prefix = self.effective_path(directory);
        let resources = self.list_resources(&prefix).await?;
        Ok(directory_prefixes(
            resources.iter().map(|r| r.public_id.as_str()),
            &prefix,
        ))
    }

    /// URL used for reads and copies, built from disk defaults only.
    fn delivery_url(&self, path: &str) -> String {
        self.get_url(path, &CallOptions::new())
    }

    async fn get_resource(&self, path: &str) -> Result<RemoteResource> {
        self.client.resource(&self.effective_path(path)).await
    }

    async fn list_resources(&self, prefix: &str) -> Result<Vec<RemoteResource>> {
        let mut query = ResourcesQuery::prefix(prefix);
        let mut resources = Vec::new();
        loop {
            let page = self.client.resources(&query).await?;
            resources.extend(page.resources);
            match page.next_cursor {
                Some(cursor) if !cursor.is_empty() => query.next_cursor = Some(cursor),
                _ => break,
            }
        }
        Ok(resources)
    }
}

#[async_trait]
impl<C: AssetClient> FilesystemAdapter for CloudinaryAdapter<C> {
    type Uploaded = RemoteResource;

    async fn write(
        &self,
        path: &str,
        contents: Bytes,
        options: &CallOptions,
    ) -> Result<FileMetadata> {
        // The temp file is removed when dropped, on every exit path
        let mut file = tokio::fs::File::from_std(tempfile::tempfile()?);
        file.write_all(&contents).await?;
        file.flush().await?;
        file.seek(SeekFrom::Start(0)).await?;

        let uploaded = self.write_stream(path, Box::new(file), options).await?;
        normalize(uploaded)
    }

    async fn write_stream(
        &self,
        path: &str,
        mut stream: ByteReader,
        options: &CallOptions,
    ) -> Result<RemoteResource> {
        let public_id = self.effective_path(path);
        let options = merge_options(&self.config, options);
        let tags = merged_tags(&options);

        let mut contents = Vec::new();
        stream.read_to_end(&mut contents).await?;
        let source = UploadSource::Data {
            contents: Bytes::from(contents),
            filename: public_id.clone(),
        };

        match self.client.upload(source, &public_id, &options, &tags).await {
            Ok(uploaded) => {
                debug!(public_id = %uploaded.public_id, "Wrote resource");
                Ok(uploaded)
            }
            Err(e @ (AdapterError::Remote { .. } | AdapterError::NotFound(_))) => {
                warn!(public_id = %public_id, reason = %e.reason(), "Upload rejected");
                Err(AdapterError::UploadFailed {
                    path: public_id,
                    reason: e.reason(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn rename(&self, path: &str, newpath: &str) -> Result<()> {
        let from = remote_identifier(&self.effective_path(path));
        let to = remote_identifier(&self.effective_path(newpath));

        let renamed = self.client.rename(&from, &to).await.map_err(|e| match e {
            AdapterError::Remote { .. } | AdapterError::NotFound(_) => AdapterError::RenameFailed {
                from: from.clone(),
                to: to.clone(),
                reason: e.reason(),
            },
            other => other,
        })?;

        if file_stem(&renamed.public_id) != file_stem(&to) {
            warn!(from = %from, to = %to, reported = %renamed.public_id, "Rename reported an unexpected id");
            return Err(AdapterError::RenameFailed {
                from,
                to,
                reason: format!("remote reported {}", renamed.public_id),
            });
        }
        Ok(())
    }

    async fn copy(&self, path: &str, newpath: &str) -> Result<()> {
        let source_url = self.delivery_url(path);
        let from = self.effective_path(path);
        let to = self.effective_path(newpath);

        let copied = self
            .client
            .upload(UploadSource::Url(source_url), &to, &Map::new(), &[])
            .await
            .map_err(|e| match e {
                AdapterError::Remote { .. } | AdapterError::NotFound(_) => AdapterError::CopyFailed {
                    from: from.clone(),
                    to: to.clone(),
                    reason: e.reason(),
                },
                other => other,
            })?;

        if copied.public_id != to {
            return Err(AdapterError::CopyFailed {
                from,
                to,
                reason: format!("remote reported {}", copied.public_id),
            });
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let public_id = self.effective_path(path);
        let response = self
            .client
            .destroy(&public_id, true)
            .await
            .map_err(|e| match e {
                AdapterError::Remote { .. } | AdapterError::NotFound(_) => AdapterError::DeleteFailed {
                    path: public_id.clone(),
                    reason: e.reason(),
                },
                other => other,
            })?;

        if response.result != "ok" {
            return Err(AdapterError::DeleteFailed {
                path: public_id,
                reason: format!("remote reported {:?}", response.result),
            });
        }
        Ok(())
    }

    async fn delete_dir(&self, dirname: &str) -> Result<DeleteDirReport> {
        let prefix = self.effective_path(dirname);
        let response = self.client.delete_resources_by_prefix(&prefix).await?;
        let deleted: Vec<String> = response
            .deleted
            .into_iter()
            .filter(|(_, outcome)| outcome == "deleted")
            .map(|(id, _)| id)
            .collect();
        debug!(prefix = %prefix, deleted = deleted.len(), partial = response.partial, "Deleted by prefix");
        Ok(DeleteDirReport {
            deleted,
            partial: response.partial,
        })
    }

    async fn create_dir(&self, dirname: &str, _options: &CallOptions) -> Result<DirRecord> {
        // Directories exist implicitly as id prefixes
        Ok(DirRecord {
            path: dirname.to_string(),
        })
    }

    async fn has(&self, path: &str) -> Result<bool> {
        match self.get_resource(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read(&self, path: &str) -> Result<ReadContents> {
        let public_id = self.effective_path(path);
        let contents = self
            .client
            .fetch(&self.delivery_url(path))
            .await
            .map_err(|e| not_found_as(e, &public_id))?;
        Ok(ReadContents {
            contents,
            path: path.to_string(),
        })
    }

    async fn read_stream(&self, path: &str) -> Result<ReadStream> {
        let public_id = self.effective_path(path);
        let stream = self
            .client
            .open(&self.delivery_url(path))
            .await
            .map_err(|e| not_found_as(e, &public_id))?;
        Ok(ReadStream {
            stream,
            path: path.to_string(),
        })
    }

    async fn list_contents(&self, directory: &str, _recursive: bool) -> Result<Vec<FileMetadata>> {
        let prefix = self.effective_path(directory);
        self.list_resources(&prefix)
            .await?
            .into_iter()
            .map(normalize)
            .collect()
    }

    async fn get_metadata(&self, path: &str) -> Result<FileMetadata> {
        normalize(self.get_resource(path).await?)
    }

    async fn get_size(&self, path: &str) -> Result<u64> {
        Ok(self.get_resource(path).await?.bytes)
    }

    async fn get_mimetype(&self, path: &str) -> Result<String> {
        Ok(resource::mimetype(&self.get_resource(path).await?))
    }

    async fn get_timestamp(&self, path: &str) -> Result<i64> {
        resource::timestamp(&self.get_resource(path).await?)
    }
}

/// Report a missing delivery URL as the missing public id.
fn not_found_as(err: AdapterError, public_id: &str) -> AdapterError {
    match err {
        AdapterError::NotFound(_) => AdapterError::NotFound(public_id.to_string()),
        other => other,
    }
}
