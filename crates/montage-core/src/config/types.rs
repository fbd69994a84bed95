//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// HTTP boundary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// Wall-clock limit for one merge request, in milliseconds
    pub request_timeout_ms: u64,

    /// Maximum accepted request body, in megabytes
    pub max_body_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            request_timeout_ms: 30000,
            max_body_mb: 64,
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker threads for the per-image stages
    pub parallel_workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of images in one request
    pub max_images: usize,

    /// Maximum decoded image dimension (width or height)
    pub max_image_dimension: u32,

    /// Maximum pixel count of the composited canvas
    pub max_canvas_pixels: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_images: 50,
            max_image_dimension: 10000,
            max_canvas_pixels: 200_000_000,
        }
    }
}

/// Which object store receives merged images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Write objects below a local directory
    #[default]
    Filesystem,
    /// PUT objects to an HTTP endpoint (S3-compatible presigned or proxy)
    Http,
}

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Bucket (or top-level directory) holding merged images
    pub bucket: String,

    /// Root directory for the filesystem backend
    pub root_dir: PathBuf,

    /// Base URL objects are PUT to (http backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Base URL returned to callers; the object key is appended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    /// Bearer token sent with uploads (http backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Prefix of every object key
    pub key_prefix: String,

    /// `Cache-Control: max-age` for stored objects, in seconds
    pub cache_max_age_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Filesystem,
            bucket: "montage-output".to_string(),
            root_dir: PathBuf::from("~/.montage/output"),
            endpoint: None,
            public_base_url: None,
            auth_token: None,
            key_prefix: "merged".to_string(),
            cache_max_age_secs: 300,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
