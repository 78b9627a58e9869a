//! In-memory `AssetClient` used by the adapter tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};

use assetfs_common::adapter::ByteReader;
use assetfs_common::error::{AdapterError, Result};

use super::{
    AssetClient, DeleteByPrefixResponse, DestroyResponse, ResourcesPage, ResourcesQuery,
    UploadSource,
};
use crate::resource::RemoteResource;

pub const CREATED_AT: &str = "2024-01-02T03:04:05Z";
const SECURE_BASE: &str = "https://res.test/";
const PLAIN_BASE: &str = "http://res.test/";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload {
        public_id: String,
        options: Map<String, Value>,
        tags: Vec<String>,
    },
    Rename {
        from: String,
        to: String,
    },
    Destroy {
        public_id: String,
        invalidate: bool,
    },
    Resource(String),
    Resources(ResourcesQuery),
    DeleteByPrefix(String),
    Url {
        public_id: String,
        secure: bool,
    },
    Fetch(String),
}

#[derive(Default)]
pub(crate) struct State {
    objects: BTreeMap<String, (RemoteResource, Bytes)>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct MemoryClient {
    pub(crate) state: Mutex<State>,
    /// Reject every upload with this message.
    pub reject_uploads: Option<String>,
    /// Report this id from rename instead of the requested one.
    pub rename_reports: Option<String>,
    /// Report this id from URL uploads (copies) instead of the requested one.
    pub copy_reports: Option<String>,
    /// Result string returned by destroy.
    pub destroy_result: Option<String>,
    /// Resources per listing page.
    pub page_size: Option<usize>,
    /// Fail every metadata lookup with a transport-like error.
    pub fail_lookups: bool,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, public_id: &str, format: &str, contents: &[u8]) {
        let resource = resource(public_id, format, contents.len());
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(public_id.to_string(), (resource, Bytes::copy_from_slice(contents)));
    }

    pub fn ids(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn id_from_url(url: &str) -> Option<&str> {
        url.strip_prefix(SECURE_BASE)
            .or_else(|| url.strip_prefix(PLAIN_BASE))
    }
}

fn resource(public_id: &str, format: &str, len: usize) -> RemoteResource {
    RemoteResource {
        public_id: public_id.to_string(),
        bytes: len as u64,
        created_at: CREATED_AT.to_string(),
        resource_type: "image".to_string(),
        format: Some(format.to_string()),
        extra: Map::new(),
    }
}

fn format_of(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("bin")
}

#[async_trait]
impl AssetClient for MemoryClient {
    async fn upload(
        &self,
        source: UploadSource,
        public_id: &str,
        options: &Map<String, Value>,
        tags: &[String],
    ) -> Result<RemoteResource> {
        self.record(Call::Upload {
            public_id: public_id.to_string(),
            options: options.clone(),
            tags: tags.to_vec(),
        });
        if let Some(message) = &self.reject_uploads {
            return Err(AdapterError::Remote {
                status: 400,
                message: message.clone(),
            });
        }
        let copying = matches!(source, UploadSource::Url(_));
        let contents = match source {
            UploadSource::Data { contents, .. } => contents,
            UploadSource::Url(url) => {
                let id = Self::id_from_url(&url)
                    .ok_or_else(|| AdapterError::NotFound(url.clone()))?;
                let found = self
                    .state
                    .lock()
                    .unwrap()
                    .objects
                    .get(id)
                    .map(|(_, data)| data.clone());
                found.ok_or_else(|| AdapterError::Remote {
                    status: 400,
                    message: format!("Resource not found - {}", url),
                })?
            }
        };
        let uploaded = resource(public_id, format_of(public_id), contents.len());
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(public_id.to_string(), (uploaded.clone(), contents));
        match &self.copy_reports {
            Some(reported) if copying => Ok(RemoteResource {
                public_id: reported.clone(),
                ..uploaded
            }),
            _ => Ok(uploaded),
        }
    }

    async fn rename(&self, from_public_id: &str, to_public_id: &str) -> Result<RemoteResource> {
        self.record(Call::Rename {
            from: from_public_id.to_string(),
            to: to_public_id.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        let (mut moved, data) = state
            .objects
            .remove(from_public_id)
            .ok_or_else(|| AdapterError::NotFound(from_public_id.to_string()))?;
        moved.public_id = self
            .rename_reports
            .clone()
            .unwrap_or_else(|| to_public_id.to_string());
        state
            .objects
            .insert(to_public_id.to_string(), (moved.clone(), data));
        Ok(moved)
    }

    async fn destroy(&self, public_id: &str, invalidate: bool) -> Result<DestroyResponse> {
        self.record(Call::Destroy {
            public_id: public_id.to_string(),
            invalidate,
        });
        let removed = self.state.lock().unwrap().objects.remove(public_id).is_some();
        let result = match &self.destroy_result {
            Some(forced) => forced.clone(),
            None if removed => "ok".to_string(),
            None => "not found".to_string(),
        };
        Ok(DestroyResponse { result })
    }

    async fn resource(&self, public_id: &str) -> Result<RemoteResource> {
        self.record(Call::Resource(public_id.to_string()));
        if self.fail_lookups {
            return Err(AdapterError::Remote {
                status: 401,
                message: "Invalid credentials".into(),
            });
        }
        self.state
            .lock()
            .unwrap()
            .objects
            .get(public_id)
            .map(|(r, _)| r.clone())
            .ok_or_else(|| AdapterError::NotFound(public_id.to_string()))
    }

    async fn resources(&self, query: &ResourcesQuery) -> Result<ResourcesPage> {
        self.record(Call::Resources(query.clone()));
        let state = self.state.lock().unwrap();
        let matching: Vec<RemoteResource> = state
            .objects
            .iter()
            .filter(|(id, _)| id.starts_with(&query.prefix))
            .map(|(_, (r, _))| r.clone())
            .collect();
        let start: usize = query
            .next_cursor
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        let size = self.page_size.unwrap_or(query.max_results as usize);
        let end = (start + size).min(matching.len());
        let next_cursor = (end < matching.len()).then(|| end.to_string());
        Ok(ResourcesPage {
            resources: matching[start.min(end)..end].to_vec(),
            next_cursor,
        })
    }

    async fn delete_resources_by_prefix(&self, prefix: &str) -> Result<DeleteByPrefixResponse> {
        self.record(Call::DeleteByPrefix(prefix.to_string()));
        let mut state = self.state.lock().unwrap();
        let doomed: Vec<String> = state
            .objects
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();
        let mut deleted = BTreeMap::new();
        for id in doomed {
            state.objects.remove(&id);
            deleted.insert(id, "deleted".to_string());
        }
        Ok(DeleteByPrefixResponse {
            deleted,
            partial: false,
        })
    }

    fn secure_url(&self, public_id: &str, _options: &Map<String, Value>) -> String {
        self.record(Call::Url {
            public_id: public_id.to_string(),
            secure: true,
        });
        format!("{}{}", SECURE_BASE, public_id)
    }

    fn url(&self, public_id: &str, _options: &Map<String, Value>) -> String {
        self.record(Call::Url {
            public_id: public_id.to_string(),
            secure: false,
        });
        format!("{}{}", PLAIN_BASE, public_id)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.record(Call::Fetch(url.to_string()));
        let id = Self::id_from_url(url).ok_or_else(|| AdapterError::NotFound(url.to_string()))?;
        self.state
            .lock()
            .unwrap()
            .objects
            .get(id)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| AdapterError::NotFound(url.to_string()))
    }

    async fn open(&self, url: &str) -> Result<ByteReader> {
        let data = self.fetch(url).await?;
        Ok(Box::new(std::io::Cursor::new(data.to_vec())))
    }
}
