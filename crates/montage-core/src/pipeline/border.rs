//! Solid-color frame around a single image.

use image::RgbaImage;

use super::composite::paste_masked;
use crate::error::{PipelineError, PipelineResult};
use crate::options::Border;

/// Size of a `width`x`height` image after a `pad`-pixel frame, or `None` on overflow.
pub fn framed_size(width: u32, height: u32, pad: u32) -> Option<(u32, u32)> {
    let grow = pad.checked_mul(2)?;
    Some((width.checked_add(grow)?, height.checked_add(grow)?))
}

/// Return `image` framed by `border.width` pixels of `border.color` on every side.
///
/// The image is pasted with its own alpha as mask, so transparent regions
/// show the border color through.
pub fn add_border(image: RgbaImage, border: &Border) -> PipelineResult<RgbaImage> {
    if border.width == 0 {
        return Ok(image);
    }
    let (width, height) = image.dimensions();
    let pad = border.width;
    let (framed_width, framed_height) =
        framed_size(width, height, pad).ok_or_else(|| PipelineError::InvalidOption {
            name: "borderWidth",
            message: format!("{pad} overflows the framed size of a {width}x{height} image"),
        })?;
    let mut framed = RgbaImage::from_pixel(framed_width, framed_height, border.color);
    paste_masked(&mut framed, &image, pad, pad);
    Ok(framed)
}
