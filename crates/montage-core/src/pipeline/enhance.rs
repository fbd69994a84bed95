//! Per-image quality enhancement.
//!
//! The image is upsampled to twice its size with Lanczos3, optionally
//! sharpened there, and downsampled back. The round trip runs even when no
//! sharpening is requested, so output pixels may differ slightly from the input.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{PipelineError, PipelineResult};

/// 3x3 smoothing kernel used as the "blurred" reference for sharpness.
/// `filter3x3` divides by the kernel sum (13).
const SMOOTH_KERNEL: [f32; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];

/// Supersample `image` and return a same-sized, optionally sharpened copy.
pub fn enhance(image: RgbaImage, factor: f32) -> PipelineResult<RgbaImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::EmptyImage {
            stage: "enhance",
            width,
            height,
        });
    }

    let mut upscaled = imageops::resize(&image, width * 2, height * 2, FilterType::Lanczos3);
    drop(image);

    if factor > 1.0 {
        upscaled = sharpen(&upscaled, factor);
    }

    Ok(imageops::resize(&upscaled, width, height, FilterType::Lanczos3))
}

/// Extrapolate away from a smoothed copy: `smooth + factor * (orig - smooth)`.
///
/// Alpha is carried over from the original unchanged.
pub fn sharpen(image: &RgbaImage, factor: f32) -> RgbaImage {
    let smooth = smooth3x3(image);
    let mut out = image.clone();
    for (o, s) in out.pixels_mut().zip(smooth.pixels()) {
        for c in 0..3 {
            let sv = s[c] as f32;
            o[c] = (sv + factor * (o[c] as f32 - sv)).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Apply [`SMOOTH_KERNEL`] to the image. Edge pixels are copied.
fn smooth3x3(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return image.clone();
    }
    // filter3x3 leaves the outer ring zeroed.
    let mut out = imageops::filter3x3(image, &SMOOTH_KERNEL);
    for (x, y, p) in out.enumerate_pixels_mut() {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            *p = *image.get_pixel(x, y);
        }
    }
    out
}
