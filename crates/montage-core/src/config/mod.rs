//! Configuration management for Montage.
//!
//! Configuration is loaded from a TOML file with sensible defaults. Every
//! section is optional; missing keys fall back to the `Default` impls.
//! The loaded value is passed explicitly to [`Montage`](crate::Montage);
//! nothing reads configuration from global state.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Montage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Object storage settings
    pub storage: StorageConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.montage.montage/config.toml
    /// - Linux: ~/.config/montage/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\montage\config\config.toml
    ///
    /// Falls back to ~/.montage/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "montage", "montage")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".montage").join("config.toml")
            })
    }

    /// Get the resolved storage root directory (with ~ expansion).
    pub fn storage_root(&self) -> PathBuf {
        let path_str = self.storage.root_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.processing.parallel_workers, 4);
        assert_eq!(config.limits.max_images, 50);
        assert_eq!(config.storage.key_prefix, "merged");
        assert_eq!(config.storage.cache_max_age_secs, 300);
        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[storage]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [storage]
            backend = "http"
            endpoint = "http://localhost:9000/bucket"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Http);
        assert_eq!(config.storage.bucket, "montage-output");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let parsed = Config::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.limits.max_image_dimension, config.limits.max_image_dimension);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[processing]\nparallel_workers = 2\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.processing.parallel_workers, 2);
    }

    #[test]
    fn test_storage_root_expands_tilde() {
        let config = Config::default();
        assert!(!config.storage_root().to_string_lossy().starts_with('~'));
    }
}
