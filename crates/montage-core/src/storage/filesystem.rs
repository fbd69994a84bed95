//! Local directory backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::store::{ObjectStore, StoredObject};
use crate::error::StorageError;

/// Writes objects to `<root>/<bucket>/<key>`.
///
/// Returned URLs are `<public_base_url>/<key>` when a base URL is configured
/// (a static file server in front of the directory), otherwise `file://` URLs.
pub struct FilesystemStore {
    bucket_dir: PathBuf,
    public_base_url: Option<String>,
}

impl FilesystemStore {
    pub fn new(root: PathBuf, bucket: &str, public_base_url: Option<String>) -> Self {
        Self {
            bucket_dir: root.join(bucket),
            public_base_url,
        }
    }

    /// Directory objects are written to.
    pub fn bucket_dir(&self) -> &Path {
        &self.bucket_dir
    }

    fn url_for(&self, key: &str, path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("file://{}", path.display()),
        }
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn put(&self, object: StoredObject) -> Result<String, StorageError> {
        if object.key.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(StorageError::Misconfigured(format!(
                "refusing to write key {:?}",
                object.key
            )));
        }
        let path = self.bucket_dir.join(&object.key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &object.bytes).await?;
        tracing::debug!(
            "Wrote {} ({} bytes, {}) to {:?}",
            object.key,
            object.bytes.len(),
            object.content_type,
            path
        );
        Ok(self.url_for(&object.key, &path))
    }
}
