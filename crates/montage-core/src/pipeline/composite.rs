//! Alpha-masked pasting shared by the border and layout stages.

use image::RgbaImage;

/// Paste `src` onto `dst` with its top-left corner at `(x, y)`.
///
/// The source alpha channel is the paste mask: every channel, alpha included,
/// becomes `(src * a + dst * (255 - a)) / 255`. Fully opaque source pixels are
/// copied exactly. Parts of `src` falling outside `dst` are clipped.
pub fn paste_masked(dst: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    let (dst_w, dst_h) = dst.dimensions();
    if x >= dst_w || y >= dst_h {
        return;
    }
    let w = src.width().min(dst_w - x);
    let h = src.height().min(dst_h - y);

    for sy in 0..h {
        for sx in 0..w {
            let s = src.get_pixel(sx, sy);
            let d = dst.get_pixel_mut(x + sx, y + sy);
            match s[3] {
                255 => *d = *s,
                0 => {}
                a => {
                    let a = a as u32;
                    for c in 0..4 {
                        d[c] = ((s[c] as u32 * a + d[c] as u32 * (255 - a) + 127) / 255) as u8;
                    }
                }
            }
        }
    }
}
