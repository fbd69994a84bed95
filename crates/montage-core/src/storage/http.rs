//! HTTP PUT backend for S3-compatible endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};

use super::store::{ObjectStore, StoredObject};
use crate::error::StorageError;

/// Upload timeout for one object.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// PUTs each object to `<endpoint>/<key>` with its content headers.
///
/// The URL handed back is `<public_base_url>/<key>`, defaulting to the
/// virtual-hosted S3 address `https://<bucket>.s3.amazonaws.com/<key>`.
pub struct HttpStore {
    client: reqwest::Client,
    endpoint: String,
    public_base_url: String,
    auth_token: Option<String>,
}

impl HttpStore {
    pub fn new(
        endpoint: &str,
        bucket: &str,
        public_base_url: Option<String>,
        auth_token: Option<String>,
    ) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self::with_client(client, endpoint, bucket, public_base_url, auth_token))
    }

    /// Use a preconfigured client (custom TLS, proxies, timeouts).
    pub fn with_client(
        client: reqwest::Client,
        endpoint: &str,
        bucket: &str,
        public_base_url: Option<String>,
        auth_token: Option<String>,
    ) -> Self {
        let public_base_url = public_base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://{bucket}.s3.amazonaws.com"));
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            public_base_url,
            auth_token,
        }
    }

    /// Where `key` is uploaded to.
    pub fn upload_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint, key)
    }

    /// Where `key` is fetched from.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn put(&self, object: StoredObject) -> Result<String, StorageError> {
        let url = self.upload_url(&object.key);
        let size = object.bytes.len();

        let mut request = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, &object.content_type)
            .header(CONTENT_DISPOSITION, &object.content_disposition)
            .header(CACHE_CONTROL, &object.cache_control)
            .body(object.bytes);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!("PUT {} returned HTTP {}: {}", url, status, text.trim());
            return Err(StorageError::Rejected {
                key: object.key,
                status: status.as_u16(),
            });
        }

        tracing::debug!("Uploaded {} ({} bytes)", object.key, size);
        Ok(self.public_url(&object.key))
    }
}
