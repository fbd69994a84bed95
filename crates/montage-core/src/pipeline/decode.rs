//! Payload decoding: base64 text to bytes, bytes to RGBA pixels.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{ImageFormat, RgbaImage};

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ImageSpec, SourceImage};

/// Image decoder with configurable limits.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// Decoded pixels, always RGBA8
    pub image: RgbaImage,
    /// Detected source format
    pub format: ImageFormat,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode a source image into RGBA pixels, enforcing dimension limits.
    pub fn decode(&self, source: &SourceImage) -> PipelineResult<DecodedImage> {
        let index = source.index;
        let reader = image::ImageReader::new(Cursor::new(&source.bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                index,
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = reader.format().ok_or_else(|| PipelineError::Decode {
            index,
            message: "Unrecognized image format".to_string(),
        })?;
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            index,
            message: e.to_string(),
        })?;

        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptyImage {
                stage: "decode",
                width,
                height,
            });
        }
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                index,
                width,
                height,
                max_dim,
            });
        }

        tracing::trace!(
            "Decoded image {} ({}, {}x{})",
            index,
            format_to_string(format),
            width,
            height
        );
        Ok(DecodedImage {
            image: image.into_rgba8(),
            format,
        })
    }
}

/// Turn a request image into raw bytes.
///
/// Accepts plain base64 or a full `data:<mime>;base64,<payload>` URL.
/// Whitespace inside the payload (line-wrapped base64) is ignored.
pub fn decode_base64(index: usize, spec: &ImageSpec) -> PipelineResult<SourceImage> {
    let payload = spec.base64.trim();
    let payload = match payload.split_once(',') {
        Some((header, rest)) if header.starts_with("data:") => rest,
        _ => payload,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(PipelineError::Base64 {
            index,
            message: "empty payload".to_string(),
        });
    }
    let bytes = BASE64.decode(cleaned).map_err(|e| PipelineError::Base64 {
        index,
        message: e.to_string(),
    })?;
    Ok(SourceImage {
        index,
        bytes,
        rotation: spec.rotation,
        border: None,
    })
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Ico => "ico".to_string(),
        ImageFormat::Pnm => "pnm".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        _ => "unknown".to_string(),
    }
}
