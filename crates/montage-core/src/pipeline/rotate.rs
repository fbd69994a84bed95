//! Rotation with canvas expansion.
//!
//! Requests specify clockwise degrees. Internally the angle is negated and fed
//! to a counter-clockwise-positive rotation, so `rotate(img, 90)` turns the
//! picture a quarter turn clockwise. Quarter turns are exact transposes; any
//! other angle is resampled bicubically onto a canvas large enough to hold
//! the rotated corners, with transparent fill outside the source.

use image::imageops;
use image::{Rgba, RgbaImage};

use crate::error::{PipelineError, PipelineResult};

/// Catmull-Rom style cubic coefficient.
const CUBIC_A: f64 = -0.5;

/// Rotate `image` clockwise by `degrees`.
pub fn rotate(image: RgbaImage, degrees: i32) -> PipelineResult<RgbaImage> {
    if degrees == 0 {
        return Ok(image);
    }
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::EmptyImage {
            stage: "rotate",
            width,
            height,
        });
    }

    let ccw = (-(degrees as i64)).rem_euclid(360) as i32;
    Ok(match ccw {
        0 => image,
        90 => imageops::rotate270(&image),
        180 => imageops::rotate180(&image),
        270 => imageops::rotate90(&image),
        _ => rotate_bicubic(&image, ccw as f64),
    })
}

/// Counter-clockwise rotation by an arbitrary angle, expanding the canvas.
fn rotate_bicubic(image: &RgbaImage, ccw_degrees: f64) -> RgbaImage {
    let (w, h) = (image.width() as f64, image.height() as f64);
    let (sin, cos) = ccw_degrees.to_radians().sin_cos();

    // Forward map (y down): x' = cos*x + sin*y, y' = -sin*x + cos*y
    let corners = [
        (-w / 2.0, -h / 2.0),
        (w / 2.0, -h / 2.0),
        (w / 2.0, h / 2.0),
        (-w / 2.0, h / 2.0),
    ];
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for (x, y) in corners {
        let rx = cos * x + sin * y;
        let ry = -sin * x + cos * y;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }
    // Snap float noise so e.g. 30° on a 2:1 image doesn't gain a pixel.
    let snap = |v: f64| (v * 1e6).round() / 1e6;
    let new_w = (snap(max_x).ceil() - snap(min_x).floor()).max(1.0) as u32;
    let new_h = (snap(max_y).ceil() - snap(min_y).floor()).max(1.0) as u32;

    let (ncx, ncy) = (new_w as f64 / 2.0, new_h as f64 / 2.0);
    let (cx, cy) = (w / 2.0, h / 2.0);

    RgbaImage::from_fn(new_w, new_h, |ox, oy| {
        let dx = ox as f64 + 0.5 - ncx;
        let dy = oy as f64 + 0.5 - ncy;
        // Inverse map back into source space
        let sx = cos * dx - sin * dy + cx;
        let sy = sin * dx + cos * dy + cy;
        if sx < 0.0 || sy < 0.0 || sx >= w || sy >= h {
            return Rgba([0, 0, 0, 0]);
        }
        sample_bicubic(image, sx - 0.5, sy - 0.5)
    })
}

fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((CUBIC_A + 2.0) * t - (CUBIC_A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((CUBIC_A * t - 5.0 * CUBIC_A) * t + 8.0 * CUBIC_A) * t - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Sample at fractional pixel coordinates; neighbours clamp to the edge.
fn sample_bicubic(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let x0 = x.floor();
    let y0 = y.floor();
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = [0.0f64; 4];
    for j in -1..=2i64 {
        let wy = cubic_weight(fy - j as f64);
        if wy == 0.0 {
            continue;
        }
        let py = (y0 + j).clamp(0, h - 1) as u32;
        for i in -1..=2i64 {
            let wx = cubic_weight(fx - i as f64);
            if wx == 0.0 {
                continue;
            }
            let px = (x0 + i).clamp(0, w - 1) as u32;
            let p = image.get_pixel(px, py);
            let weight = wx * wy;
            for c in 0..4 {
                acc[c] += p[c] as f64 * weight;
            }
        }
    }
    Rgba(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
}
