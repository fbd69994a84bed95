//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::{Config, StorageBackend};

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "server.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.server.max_body_mb == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_body_mb must be > 0".into(),
            ));
        }
        if self.limits.max_images == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_images must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.max_canvas_pixels == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_canvas_pixels must be > 0".into(),
            ));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.bucket must not be empty".into(),
            ));
        }
        if self.storage.key_prefix.contains("..") {
            return Err(ConfigError::ValidationError(
                "storage.key_prefix must not contain '..'".into(),
            ));
        }
        if self.storage.backend == StorageBackend::Http && self.storage.endpoint.is_none() {
            return Err(ConfigError::ValidationError(
                "storage.endpoint is required for the http backend".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}
