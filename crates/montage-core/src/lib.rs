//! Montage Core - Embeddable image compositing library.
//!
//! Montage takes an ordered batch of base64-encoded images plus layout
//! options and produces a single composited image, persisted to an object
//! store under a fresh key.
//!
//! # Architecture
//!
//! ```text
//! base64 → Decode → Enhance → Rotate → Border ─┐   (per image, in parallel)
//!                                               ▼
//!                      Layout → Finalize → Encode → Store → URL
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use montage_core::{Config, MergeRequest, Montage};
//!
//! #[tokio::main]
//! async fn main() -> montage_core::Result<()> {
//!     let config = Config::load()?;
//!     let montage = Montage::from_config(config)?;
//!
//!     let request: MergeRequest = serde_json::from_str(&body)?;
//!     let outcome = montage.merge(request).await?;
//!     println!("Merged image at {}", outcome.url);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod color;
pub mod config;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod storage;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, ErrorKind, MontageError, PipelineError, PipelineResult, Result, StorageError,
};
pub use options::{MergeOptions, MergeSettings, OutputFormat};
pub use pipeline::{EncodedImage, MergeProcessor};
pub use storage::{MemoryStore, ObjectStore, StoreFactory, StoredObject};
pub use types::{ErrorResponse, ImageSpec, MergeOutcome, MergeRequest, MergeResponse, SourceImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Montage merger - the main entry point for image compositing.
///
/// Holds the configuration, the worker pool and the object store. Cheap to
/// share behind an `Arc`; every method takes `&self`.
pub struct Montage {
    config: Config,
    processor: Arc<MergeProcessor>,
    store: Arc<dyn ObjectStore>,
}

impl Montage {
    /// Create a new Montage instance with an explicit store.
    pub fn new(config: Config, store: Arc<dyn ObjectStore>) -> Result<Self> {
        let processor = MergeProcessor::new(&config)?;
        tracing::debug!(
            "Initializing Montage v{} ({} workers, {} store)",
            VERSION,
            processor.workers(),
            store.name()
        );
        Ok(Self {
            config,
            processor: Arc::new(processor),
            store,
        })
    }

    /// Create a new Montage instance with the store named in `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = StoreFactory::create(&config)?;
        Self::new(config, store)
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name of the configured storage backend.
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Merge a parsed request and persist the result.
    pub async fn merge(&self, request: MergeRequest) -> PipelineResult<MergeOutcome> {
        let settings = request.options.resolve()?;
        self.check_batch(request.images.len())?;
        let sources = request
            .images
            .iter()
            .enumerate()
            .map(|(index, spec)| -> PipelineResult<SourceImage> {
                let mut source = pipeline::decode_base64(index, spec)?;
                source.border = spec.border_override(&request.options)?;
                Ok(source)
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        let encoded = self.render(sources, settings).await?;
        self.store(encoded).await
    }

    /// Run the pipeline on already-decoded sources without persisting.
    ///
    /// The blocking work runs on tokio's blocking pool so the caller's
    /// runtime stays responsive.
    pub async fn render(
        &self,
        sources: Vec<SourceImage>,
        settings: MergeSettings,
    ) -> PipelineResult<EncodedImage> {
        self.check_batch(sources.len())?;
        let processor = Arc::clone(&self.processor);
        tokio::task::spawn_blocking(move || processor.render(sources, &settings))
            .await
            .map_err(|e| PipelineError::Worker(format!("Merge task failed: {}", e)))?
    }

    /// Persist an encoded image under a fresh key.
    pub async fn store(&self, encoded: EncodedImage) -> PipelineResult<MergeOutcome> {
        let start = Instant::now();
        let storage = &self.config.storage;
        let key = storage::object_key(&storage.key_prefix, encoded.format.extension());
        let (width, height) = (encoded.width, encoded.height);
        let content_type = encoded.content_type();
        let size_bytes = encoded.bytes.len();

        let object = StoredObject::merged_image(key.clone(), encoded, storage.cache_max_age_secs);
        let url = self.store.put(object).await?;

        tracing::info!(
            "Stored {} ({}x{}, {} bytes) via {} in {:?}",
            key,
            width,
            height,
            size_bytes,
            self.store.name(),
            start.elapsed()
        );
        Ok(MergeOutcome {
            url,
            key,
            width,
            height,
            content_type,
            size_bytes,
        })
    }

    fn check_batch(&self, count: usize) -> PipelineResult<()> {
        let max = self.config.limits.max_images;
        if count == 0 {
            Err(PipelineError::EmptyBatch)
        } else if count > max {
            Err(PipelineError::TooManyImages { count, max })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_base64(w: u32, h: u32) -> String {
        let mut buf = Cursor::new(Vec::new());
        RgbaImage::from_pixel(w, h, Rgba([90, 160, 30, 255]))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    }

    fn montage(config: Config) -> (Montage, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new("test"));
        let montage = Montage::new(config, store.clone()).unwrap();
        (montage, store)
    }

    fn request(json: &str) -> MergeRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_merge_stores_object() {
        let (montage, store) = montage(Config::default());
        let body = format!(
            r#"{{"images": [{{"base64": "{}"}}], "options": {{"outputFormat": "jpeg"}}}}"#,
            png_base64(20, 10)
        );
        let outcome = montage.merge(request(&body)).await.unwrap();

        assert_eq!((outcome.width, outcome.height), (550, 275));
        assert_eq!(outcome.content_type, "image/jpeg");
        assert!(outcome.key.starts_with("merged/"));
        assert!(outcome.key.ends_with(".jpeg"));
        assert_eq!(outcome.url, format!("memory://test/{}", outcome.key));

        let stored = store.get(&outcome.key).unwrap();
        assert_eq!(stored.bytes.len(), outcome.size_bytes);
        assert_eq!(stored.cache_control, "max-age=300");
    }

    #[tokio::test]
    async fn test_merge_rejects_empty_batch() {
        let (montage, store) = montage(Config::default());
        let err = montage.merge(request(r#"{"images": []}"#)).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyBatch));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_merge_enforces_image_limit() {
        let mut config = Config::default();
        config.limits.max_images = 1;
        let (montage, _) = montage(config);
        let image = png_base64(4, 4);
        let body = format!(r#"{{"images": [{{"base64": "{image}"}}, {{"base64": "{image}"}}]}}"#);
        let err = montage.merge(request(&body)).await.unwrap_err();
        assert!(matches!(err, PipelineError::TooManyImages { count: 2, max: 1 }));
    }

    #[tokio::test]
    async fn test_bad_option_fails_before_storing() {
        let (montage, store) = montage(Config::default());
        let body = format!(
            r##"{{"images": [{{"base64": "{}"}}], "options": {{"borderColor": "#zzz"}}}}"##,
            png_base64(4, 4)
        );
        let err = montage.merge(request(&body)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parameter);
        assert!(store.is_empty());
    }
}
