//! Pipeline orchestration - wires together all processing stages.

use std::time::Instant;

use image::RgbaImage;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::config::{Config, LimitsConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::options::{Border, MergeSettings};
use crate::types::SourceImage;

use super::border::{add_border, framed_size};
use super::decode::{format_to_string, ImageDecoder};
use super::encode::{encode, EncodedImage};
use super::enhance::enhance;
use super::finalize::finalize;
use super::layout::{compose, plan};
use super::rotate::rotate;

/// Runs a batch of source images through every stage and encodes the result.
///
/// Per-image work (decode, enhance, rotate, border) and the layout resize run
/// on a dedicated rayon pool sized by `processing.parallel_workers`. All
/// methods are blocking; call them from `spawn_blocking` in async code.
pub struct MergeProcessor {
    decoder: ImageDecoder,
    limits: LimitsConfig,
    pool: ThreadPool,
}

impl MergeProcessor {
    /// Create a new processor with the given configuration.
    pub fn new(config: &Config) -> PipelineResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.processing.parallel_workers)
            .thread_name(|i| format!("montage-worker-{i}"))
            .build()
            .map_err(|e| PipelineError::Worker(format!("Cannot start worker pool: {}", e)))?;

        Ok(Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            limits: config.limits.clone(),
            pool,
        })
    }

    /// Number of worker threads in the pool.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Merge `sources` into one encoded image.
    ///
    /// Output order follows `sources` order regardless of which worker
    /// finishes first. The first failing image aborts the whole batch.
    pub fn render(
        &self,
        sources: Vec<SourceImage>,
        settings: &MergeSettings,
    ) -> PipelineResult<EncodedImage> {
        if sources.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }
        let start = Instant::now();
        let count = sources.len();

        let prepared: Vec<RgbaImage> = self.pool.install(|| {
            sources
                .par_iter()
                .map(|source| self.prepare(source, settings))
                .collect::<PipelineResult<Vec<_>>>()
        })?;
        tracing::trace!("  Prepare: {:?}", start.elapsed());

        let sizes: Vec<(u32, u32)> = prepared.iter().map(|i| i.dimensions()).collect();
        let plan = plan(&sizes, &settings.layout)?;
        if plan.pixel_count() > self.limits.max_canvas_pixels {
            return Err(PipelineError::CanvasTooLarge {
                width: plan.width as u64,
                height: plan.height as u64,
                max_pixels: self.limits.max_canvas_pixels,
            });
        }

        let compose_start = Instant::now();
        let mut canvas = self
            .pool
            .install(|| compose(prepared, &plan, settings.layout.background))?;
        tracing::trace!("  Compose: {:?}", compose_start.elapsed());

        let finalize_start = Instant::now();
        finalize(&mut canvas)?;
        tracing::trace!("  Finalize: {:?}", finalize_start.elapsed());

        let encode_start = Instant::now();
        let encoded = encode(&canvas, settings.output_format, settings.quality)?;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        tracing::debug!(
            "Merged {} images into {}x{} {} in {:?}",
            count,
            encoded.width,
            encoded.height,
            encoded.format.extension(),
            start.elapsed()
        );
        Ok(encoded)
    }

    /// Decode, enhance, rotate and frame one image.
    fn prepare(&self, source: &SourceImage, settings: &MergeSettings) -> PipelineResult<RgbaImage> {
        let decoded = self.decoder.decode(source)?;
        tracing::trace!(
            "Image {}: {} {}x{}, rotation {}",
            source.index,
            format_to_string(decoded.format),
            decoded.image.width(),
            decoded.image.height(),
            source.rotation
        );

        let image = enhance(decoded.image, settings.enhance_factor)?;
        let image = rotate(image, source.rotation)?;
        match source.border.as_ref().or(settings.border.as_ref()) {
            Some(border) => self.frame(source.index, image, border),
            None => Ok(image),
        }
    }

    /// Add `border`, refusing frames larger than `limits.max_image_dimension`
    /// before anything is allocated.
    fn frame(&self, index: usize, image: RgbaImage, border: &Border) -> PipelineResult<RgbaImage> {
        let max_dim = self.limits.max_image_dimension;
        let (width, height) = image.dimensions();
        let (width, height) =
            framed_size(width, height, border.width).unwrap_or((u32::MAX, u32::MAX));
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                index,
                width,
                height,
                max_dim,
            });
        }
        add_border(image, border)
    }
}
