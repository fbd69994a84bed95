//! Canvas encoding for every supported output codec.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

use crate::error::{PipelineError, PipelineResult};
use crate::options::{OutputFormat, Quality};

/// An encoded canvas ready to be persisted.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn content_type(&self) -> String {
        self.format.content_type()
    }
}

/// Composite `canvas` over opaque white and drop the alpha channel.
pub fn flatten(canvas: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let p = canvas.get_pixel(x, y);
        let a = p[3] as u32;
        let over_white = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([over_white(p[0]), over_white(p[1]), over_white(p[2])])
    })
}

/// Encode `canvas` in `format`.
///
/// PNG keeps alpha and uses fast compression. JPEG and WebP honour `quality`;
/// WebP goes through libwebp's lossy encoder and keeps alpha. Codecs without
/// an alpha channel receive a flattened copy.
pub fn encode(
    canvas: &RgbaImage,
    format: OutputFormat,
    quality: Quality,
) -> PipelineResult<EncodedImage> {
    let (width, height) = canvas.dimensions();
    let mut bytes = Vec::new();

    let result = match format {
        OutputFormat::Png => PngEncoder::new_with_quality(
            &mut bytes,
            CompressionType::Fast,
            PngFilterType::Adaptive,
        )
        .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgba8),
        OutputFormat::Jpeg => {
            let rgb = flatten(canvas);
            JpegEncoder::new_with_quality(&mut bytes, quality.value()).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::WebP => {
            let memory = webp::Encoder::from_rgba(canvas.as_raw(), width, height)
                .encode_simple(false, quality.value() as f32)
                .map_err(|e| PipelineError::Encode {
                    format: format.extension().to_string(),
                    message: format!("{e:?}"),
                })?;
            bytes.extend_from_slice(&memory);
            Ok(())
        }
        other => {
            let image = if other.supports_alpha() {
                DynamicImage::ImageRgba8(canvas.clone())
            } else {
                DynamicImage::ImageRgb8(flatten(canvas))
            };
            image.write_to(&mut Cursor::new(&mut bytes), other.image_format())
        }
    };

    result.map_err(|e| PipelineError::Encode {
        format: format.extension().to_string(),
        message: e.to_string(),
    })?;

    tracing::trace!(
        "Encoded {}x{} canvas as {} ({} bytes)",
        width,
        height,
        format.extension(),
        bytes.len()
    );
    Ok(EncodedImage {
        bytes,
        format,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Smooth gradient with varying alpha; the kind of content lossy codecs handle well.
    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([
                (x * 255 / (w - 1)) as u8,
                (y * 255 / (h - 1)) as u8,
                128,
                255 - (x * 100 / (w - 1)) as u8,
            ])
        })
    }

    #[test]
    fn test_png_round_trip_is_lossless() {
        let canvas = gradient(32, 24);
        let encoded = encode(&canvas, OutputFormat::Png, Quality::default()).unwrap();
        assert_eq!(encoded.content_type(), "image/png");

        let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgba8();
        assert_eq!(decoded, canvas);
    }

    #[test]
    fn test_jpeg_round_trip_within_tolerance() {
        // Baseline JPEG at quality 100 still quantizes DCT coefficients and
        // converts through YCbCr; on a smooth gradient the per-channel error
        // stays well inside this bound.
        const TOLERANCE: i32 = 8;

        let mut canvas = gradient(64, 64);
        for p in canvas.pixels_mut() {
            p[3] = 255;
        }
        let q100 = Quality::new(100).unwrap();
        let encoded = encode(&canvas, OutputFormat::Jpeg, q100).unwrap();
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgb8();
        for (d, s) in decoded.pixels().zip(canvas.pixels()) {
            for c in 0..3 {
                let delta = (d[c] as i32 - s[c] as i32).abs();
                assert!(delta <= TOLERANCE, "channel {c} off by {delta}");
            }
        }
    }

    #[test]
    fn test_flatten_composites_over_white() {
        let canvas = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([10, 20, 30, 255])
            }
        });
        let flat = flatten(&canvas);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_webp_is_riff() {
        let encoded = encode(&gradient(8, 8), OutputFormat::WebP, Quality::default()).unwrap();
        assert_eq!(&encoded.bytes[0..4], b"RIFF");
        assert_eq!(encoded.format.extension(), "webp");
    }

    #[test]
    fn test_webp_quality_trades_size() {
        let canvas = gradient(64, 64);
        let low = encode(&canvas, OutputFormat::WebP, Quality::new(10).unwrap()).unwrap();
        let high = encode(&canvas, OutputFormat::WebP, Quality::new(100).unwrap()).unwrap();
        assert!(low.bytes.len() < high.bytes.len(), "{} vs {}", low.bytes.len(), high.bytes.len());

        let decoded = image::load_from_memory(&high.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (64, 64));
        // Alpha survives: the right edge is more transparent than the left.
        assert!(decoded.get_pixel(63, 32)[3] < decoded.get_pixel(0, 32)[3]);
    }

    #[test]
    fn test_other_codecs_encode() {
        let canvas = gradient(8, 8);
        for format in [OutputFormat::Bmp, OutputFormat::Gif, OutputFormat::Tiff] {
            let encoded = encode(&canvas, format, Quality::default()).unwrap();
            let decoded = image::load_from_memory(&encoded.bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (8, 8), "{format:?}");
        }
    }
}
