//! Cloudinary REST client.
//!
//! Talks to the upload API (signed with SHA-256 request signatures) and the
//! admin API (HTTP basic auth) with reqwest directly, so no SDK dependency
//! is needed.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use chrono::Utc;
use futures::TryStreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tokio_util::io::StreamReader;
use tracing::debug;

use assetfs_common::adapter::ByteReader;
use assetfs_common::error::{AdapterError, Result};

use super::url::{encode_public_id, UrlBuilder};
use super::{
    AssetClient, DeleteByPrefixResponse, DestroyResponse, ResourcesPage, ResourcesQuery,
    UploadSource,
};
use crate::config::DiskConfig;
use crate::options::option_string;
use crate::resource::RemoteResource;

/// Parameters never covered by the request signature.
const UNSIGNED_PARAMS: [&str; 5] = ["file", "api_key", "resource_type", "cloud_name", "signature"];

/// Merged options that are not forwarded as upload parameters.
const NON_UPLOAD_OPTIONS: [&str; 7] = [
    "secure",
    "tags",
    "resource_type",
    "file",
    "api_key",
    "signature",
    "timestamp",
];

const DEFAULT_ADMIN_RESOURCE_TYPE: &str = "image";
const DELIVERY_TYPE: &str = "upload";

pub struct HttpClient {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base_url: String,
    urls: UrlBuilder,
    client: Client,
}

impl HttpClient {
    pub fn new(config: &DiskConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            urls: UrlBuilder::new(config.cloud_name.clone(), config.cname.clone()),
            client: builder.build()?,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1_1/{}/{}", self.api_base_url, self.cloud_name, path)
    }

    fn resources_url(&self, resource_type: &str, delivery_type: &str) -> String {
        self.api_url(&format!("resources/{}/{}", resource_type, delivery_type))
    }

    /// POST signed parameters to an upload API endpoint.
    async fn post_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        mut params: BTreeMap<String, String>,
        subject: &str,
    ) -> Result<T> {
        params.insert("timestamp".into(), Utc::now().timestamp().to_string());
        let signature = api_sign_request(&params, &self.api_secret);
        params.insert("signature".into(), signature);
        params.insert("api_key".into(), self.api_key.clone());

        let resp = self
            .client
            .post(self.api_url(path))
            .json(&params)
            .send()
            .await?;
        parse_response(resp, subject).await
    }
}

/// Hex SHA-256 of the sorted `key=value` pairs joined by `&`, followed by
/// the API secret. Empty values and unsigned parameters are skipped.
pub fn api_sign_request(params: &BTreeMap<String, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(k, v)| !v.is_empty() && !UNSIGNED_PARAMS.contains(&k.as_str()))
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha256::digest(format!("{}{}", to_sign, api_secret).as_bytes()))
}

/// Upload parameters for `public_id` from merged call options.
fn upload_params(
    options: &Map<String, Value>,
    public_id: &str,
    tags: &[String],
) -> BTreeMap<String, String> {
    let mut params: BTreeMap<String, String> = options
        .iter()
        .filter(|(k, _)| !NON_UPLOAD_OPTIONS.contains(&k.as_str()))
        .filter_map(|(k, v)| option_string(v).map(|s| (k.clone(), s)))
        .collect();
    params.insert("public_id".into(), public_id.to_string());
    if !tags.is_empty() {
        params.insert("tags".into(), tags.join(","));
    }
    params
}

/// The `file` parameter for an upload.
fn file_param(source: UploadSource) -> String {
    match source {
        UploadSource::Data { contents, filename } => {
            let mime = mime_guess::from_path(&filename).first_or_octet_stream();
            format!(
                "data:{};base64,{}",
                mime.essence_str(),
                base64::engine::general_purpose::STANDARD.encode(&contents)
            )
        }
        UploadSource::Url(url) => url,
    }
}

fn prefix_query(prefix: &str) -> String {
    format!("prefix={}", urlencoding::encode(prefix))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.to_string())
}

async fn check_status(resp: Response, subject: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(AdapterError::NotFound(subject.to_string()));
    }
    let body = resp.text().await.unwrap_or_default();
    Err(AdapterError::Remote {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

async fn parse_response<T: DeserializeOwned>(resp: Response, subject: &str) -> Result<T> {
    Ok(check_status(resp, subject).await?.json().await?)
}

#[async_trait]
impl AssetClient for HttpClient {
    async fn upload(
        &self,
        source: UploadSource,
        public_id: &str,
        options: &Map<String, Value>,
        tags: &[String],
    ) -> Result<RemoteResource> {
        let resource_type = options
            .get("resource_type")
            .and_then(option_string)
            .unwrap_or_else(|| "auto".to_string());
        let mut params = upload_params(options, public_id, tags);
        params.insert("file".into(), file_param(source));

        let uploaded: RemoteResource = self
            .post_signed(&format!("{}/upload", resource_type), params, public_id)
            .await?;
        debug!(public_id = %uploaded.public_id, bytes = uploaded.bytes, "Cloudinary upload complete");
        Ok(uploaded)
    }

    async fn rename(&self, from_public_id: &str, to_public_id: &str) -> Result<RemoteResource> {
        let mut params = BTreeMap::new();
        params.insert("from_public_id".to_string(), from_public_id.to_string());
        params.insert("to_public_id".to_string(), to_public_id.to_string());
        let renamed: RemoteResource = self
            .post_signed(
                &format!("{}/rename", DEFAULT_ADMIN_RESOURCE_TYPE),
                params,
                from_public_id,
            )
            .await?;
        debug!(from = %from_public_id, to = %renamed.public_id, "Cloudinary rename complete");
        Ok(renamed)
    }

    async fn destroy(&self, public_id: &str, invalidate: bool) -> Result<DestroyResponse> {
        let mut params = BTreeMap::new();
        params.insert("public_id".to_string(), public_id.to_string());
        params.insert("invalidate".to_string(), invalidate.to_string());
        let response: DestroyResponse = self
            .post_signed(
                &format!("{}/destroy", DEFAULT_ADMIN_RESOURCE_TYPE),
                params,
                public_id,
            )
            .await?;
        debug!(public_id = %public_id, result = %response.result, "Cloudinary destroy complete");
        Ok(response)
    }

    async fn resource(&self, public_id: &str) -> Result<RemoteResource> {
        let url = format!(
            "{}/{}",
            self.resources_url(DEFAULT_ADMIN_RESOURCE_TYPE, DELIVERY_TYPE),
            encode_public_id(public_id)
        );
        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await?;
        parse_response(resp, public_id).await
    }

    async fn resources(&self, query: &ResourcesQuery) -> Result<ResourcesPage> {
        let mut url = format!(
            "{}?{}&max_results={}",
            self.resources_url(&query.resource_type, &query.delivery_type),
            prefix_query(&query.prefix),
            query.max_results
        );
        if let Some(cursor) = &query.next_cursor {
            url.push_str("&next_cursor=");
            url.push_str(&urlencoding::encode(cursor));
        }
        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await?;
        let page: ResourcesPage = parse_response(resp, &query.prefix).await?;
        debug!(prefix = %query.prefix, count = page.resources.len(), "Cloudinary list complete");
        Ok(page)
    }

    async fn delete_resources_by_prefix(&self, prefix: &str) -> Result<DeleteByPrefixResponse> {
        let url = format!(
            "{}?{}",
            self.resources_url(DEFAULT_ADMIN_RESOURCE_TYPE, DELIVERY_TYPE),
            prefix_query(prefix)
        );
        let resp = self
            .client
            .delete(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await?;
        let response: DeleteByPrefixResponse = parse_response(resp, prefix).await?;
        debug!(prefix = %prefix, deleted = response.deleted.len(), partial = response.partial, "Cloudinary prefix delete complete");
        Ok(response)
    }

    fn secure_url(&self, public_id: &str, options: &Map<String, Value>) -> String {
        self.urls.build(public_id, options, true)
    }

    fn url(&self, public_id: &str, options: &Map<String, Value>) -> String {
        self.urls.build(public_id, options, false)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let resp = check_status(self.client.get(url).send().await?, url).await?;
        Ok(resp.bytes().await?)
    }

    async fn open(&self, url: &str) -> Result<ByteReader> {
        let resp = check_status(self.client.get(url).send().await?, url).await?;
        let stream = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }
}
