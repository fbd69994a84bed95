//! Object store trait, stored-object type, and the backend factory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, StorageBackend};
use crate::error::StorageError;
use crate::pipeline::EncodedImage;

/// An object plus the HTTP metadata it should be served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub content_disposition: String,
    pub cache_control: String,
}

impl StoredObject {
    /// Wrap an encoded merge result for upload.
    ///
    /// The object downloads as `merged-image.<ext>` and may be cached for
    /// `cache_max_age_secs`.
    pub fn merged_image(key: String, encoded: EncodedImage, cache_max_age_secs: u64) -> Self {
        let extension = encoded.format.extension();
        Self {
            key,
            content_type: encoded.content_type(),
            content_disposition: format!("attachment; filename=\"merged-image.{extension}\""),
            cache_control: format!("max-age={cache_max_age_secs}"),
            bytes: encoded.bytes,
        }
    }
}

/// Trait that all storage backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (`Montage` holds an `Arc<dyn ObjectStore>`).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logging (e.g., "filesystem", "http").
    fn name(&self) -> &str;

    /// Persist `object` and return the URL it can be fetched from.
    async fn put(&self, object: StoredObject) -> Result<String, StorageError>;
}

/// Build a fresh, collision-free key: `<prefix>/<uuid-v4>.<extension>`.
pub fn object_key(prefix: &str, extension: &str) -> String {
    let id = uuid::Uuid::new_v4();
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{id}.{extension}")
    } else {
        format!("{prefix}/{id}.{extension}")
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Factory that creates the configured storage backend.
pub struct StoreFactory;

impl StoreFactory {
    /// Create the backend named by `config.storage.backend`.
    pub fn create(config: &Config) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let storage = &config.storage;
        match storage.backend {
            StorageBackend::Filesystem => Ok(Arc::new(super::FilesystemStore::new(
                config.storage_root(),
                &storage.bucket,
                storage.public_base_url.clone(),
            ))),
            StorageBackend::Http => {
                let endpoint = storage.endpoint.as_deref().ok_or_else(|| {
                    StorageError::Misconfigured("http backend needs storage.endpoint".into())
                })?;
                let token = storage.auth_token.as_deref().and_then(resolve_env_var);
                Ok(Arc::new(super::HttpStore::new(
                    endpoint,
                    &storage.bucket,
                    storage.public_base_url.clone(),
                    token,
                )?))
            }
        }
    }
}
