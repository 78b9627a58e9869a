//! The remote asset service as seen by the adapter.

pub mod http;
#[cfg(test)]
pub(crate) mod memory;
pub mod url;

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Map, Value};

use assetfs_common::adapter::ByteReader;
use assetfs_common::error::Result;

use crate::resource::RemoteResource;

/// What an upload sends as the asset's content.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadSource {
    /// Raw bytes. `filename` only drives the content type.
    Data { contents: Bytes, filename: String },
    /// A URL the remote fetches the content from.
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DestroyResponse {
    pub result: String,
}

/// A single page request against the resource listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesQuery {
    pub resource_type: String,
    pub delivery_type: String,
    pub prefix: String,
    pub max_results: u32,
    pub next_cursor: Option<String>,
}

impl ResourcesQuery {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            resource_type: "image".to_string(),
            delivery_type: "upload".to_string(),
            prefix: prefix.into(),
            max_results: 500,
            next_cursor: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcesPage {
    #[serde(default)]
    pub resources: Vec<RemoteResource>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Response of a bulk prefix deletion: each matched id maps to its outcome
/// (`"deleted"`, `"not_found"`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteByPrefixResponse {
    #[serde(default)]
    pub deleted: BTreeMap<String, String>,
    #[serde(default)]
    pub partial: bool,
}

/// Operations the adapter needs from the remote asset service.
///
/// The adapter owns its client; nothing here is process-global.
#[async_trait]
pub trait AssetClient: Send + Sync {
    /// Upload `source` under `public_id`. `options` are merged call options.
    async fn upload(
        &self,
        source: UploadSource,
        public_id: &str,
        options: &Map<String, Value>,
        tags: &[String],
    ) -> Result<RemoteResource>;

    async fn rename(&self, from_public_id: &str, to_public_id: &str) -> Result<RemoteResource>;

    async fn destroy(&self, public_id: &str, invalidate: bool) -> Result<DestroyResponse>;

    /// Fetch one resource's details. A missing resource is `NotFound`.
    async fn resource(&self, public_id: &str) -> Result<RemoteResource>;

    async fn resources(&self, query: &ResourcesQuery) -> Result<ResourcesPage>;

    async fn delete_resources_by_prefix(&self, prefix: &str) -> Result<DeleteByPrefixResponse>;

    /// https delivery URL.
    fn secure_url(&self, public_id: &str, options: &Map<String, Value>) -> String;

    /// Plain http delivery URL.
    fn url(&self, public_id: &str, options: &Map<String, Value>) -> String;

    /// Download the bytes behind a delivery URL.
    async fn fetch(&self, url: &str) -> Result<Bytes>;

    /// Open a byte stream on a delivery URL.
    async fn open(&self, url: &str) -> Result<ByteReader>;
}
