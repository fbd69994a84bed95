//! Final post-processing pass over the composited canvas.

use image::{imageops, RgbaImage};

use crate::error::{PipelineError, PipelineResult};

/// Unsharp-mask parameters.
///
/// - `sigma`: Standard deviation of the Gaussian blur used as reference
/// - `percent`: How much of the difference to add back (150 = 1.5x)
/// - `threshold`: Minimum per-channel difference before a pixel is touched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpMask {
    pub sigma: f32,
    pub percent: i32,
    pub threshold: i32,
}

impl UnsharpMask {
    /// Subtle sharpening applied to every merged canvas.
    pub fn subtle() -> Self {
        Self {
            sigma: 1.0,
            percent: 150,
            threshold: 3,
        }
    }
}

/// Contrast factor applied after sharpening (+10%).
pub const CONTRAST_FACTOR: f32 = 1.1;

/// Sharpen then boost contrast, in place.
pub fn finalize(canvas: &mut RgbaImage) -> PipelineResult<()> {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::EmptyImage {
            stage: "finalize",
            width,
            height,
        });
    }
    unsharp_mask(canvas, UnsharpMask::subtle());
    adjust_contrast(canvas, CONTRAST_FACTOR);
    Ok(())
}

/// Add back `percent`% of the difference to a blurred copy on RGB channels.
pub fn unsharp_mask(image: &mut RgbaImage, params: UnsharpMask) {
    let blurred = imageops::blur(&*image, params.sigma);
    for (p, b) in image.pixels_mut().zip(blurred.pixels()) {
        for c in 0..3 {
            let orig = p[c] as i32;
            let diff = orig - b[c] as i32;
            if diff.abs() >= params.threshold {
                p[c] = (orig + diff * params.percent / 100).clamp(0, 255) as u8;
            }
        }
    }
}

/// Scale RGB distances from the mean luminance by `factor`.
///
/// Luminance uses ITU-R 601 weights; alpha is untouched.
pub fn adjust_contrast(image: &mut RgbaImage, factor: f32) {
    let pixel_count = image.width() as u64 * image.height() as u64;
    if pixel_count == 0 {
        return;
    }
    let luma_sum: u64 = image
        .pixels()
        .map(|p| (p[0] as u64 * 299 + p[1] as u64 * 587 + p[2] as u64 * 114) / 1000)
        .sum();
    let mean = (luma_sum as f32 / pixel_count as f32).round();

    for p in image.pixels_mut() {
        for c in 0..3 {
            let v = mean + factor * (p[c] as f32 - mean);
            p[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn edge(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, _| {
            if x < w / 2 {
                Rgba([60, 60, 60, 255])
            } else {
                Rgba([190, 190, 190, 255])
            }
        })
    }

    #[test]
    fn test_finalize_keeps_dimensions() {
        let mut canvas = edge(12, 9);
        finalize(&mut canvas).unwrap();
        assert_eq!(canvas.dimensions(), (12, 9));
    }

    #[test]
    fn test_finalize_rejects_empty_canvas() {
        let mut canvas = RgbaImage::new(0, 0);
        assert!(finalize(&mut canvas).is_err());
    }

    #[test]
    fn test_finalize_is_deterministic() {
        let mut a = edge(16, 4);
        let mut b = edge(16, 4);
        finalize(&mut a).unwrap();
        finalize(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unsharp_mask_steepens_edges() {
        let mut img = edge(16, 4);
        unsharp_mask(&mut img, UnsharpMask::subtle());
        // Dark side of the edge gets darker, bright side brighter.
        assert!(img.get_pixel(7, 2)[0] < 60);
        assert!(img.get_pixel(8, 2)[0] > 190);
        // Far from the edge the blur matches the original, below threshold.
        assert_eq!(img.get_pixel(0, 2)[0], 60);
    }

    #[test]
    fn test_unsharp_mask_leaves_flat_regions() {
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([123, 45, 67, 200]));
        let before = img.clone();
        unsharp_mask(&mut img, UnsharpMask::subtle());
        assert_eq!(img, before);
    }

    #[test]
    fn test_contrast_spreads_around_mean() {
        let mut img = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([102, 102, 102, 255])
            } else {
                Rgba([148, 148, 148, 90])
            }
        });
        adjust_contrast(&mut img, CONTRAST_FACTOR);
        // mean = 125: 102 -> 99.7, 148 -> 150.3
        assert_eq!(img.get_pixel(0, 0)[0], 100);
        assert_eq!(img.get_pixel(1, 0)[0], 150);
        assert_eq!(img.get_pixel(1, 0)[3], 90);
    }

    #[test]
    fn test_contrast_identity_factor() {
        let mut img = edge(6, 3);
        let before = img.clone();
        adjust_contrast(&mut img, 1.0);
        assert_eq!(img, before);
    }
}
