//! Layout engine: scale a batch to a common dimension and composite it.
//!
//! Layout is split in two:
//! - [`plan`] is pure geometry. From the prepared image sizes it derives every
//!   scaled size, every placement and the canvas size. Nothing is allocated.
//! - [`compose`] resizes the images to their planned sizes (Lanczos3, in
//!   parallel) and pastes them onto a background-filled canvas.
//!
//! Placement rules per [`Direction`]:
//!
//! | Direction | Canvas | Cross-axis alignment |
//! |---|---|---|
//! | `vertical` | max width x (sum heights + gaps) | left / center / right on x |
//! | `horizontal` | (sum widths + gaps) x max height | left and center = top, right = bottom |
//! | `horizontal_2x` | (col0 + spacing + col1) x (sum row heights + gaps) | per-column on x, rows centred on y |

use image::imageops::{self, FilterType};
use image::RgbaImage;
use rayon::prelude::*;

use super::composite::paste_masked;
use crate::error::{PipelineError, PipelineResult};
use crate::options::{Alignment, Direction, LayoutOptions};

/// Where one image lands on the canvas, at its scaled size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Canvas size plus one placement per input image, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

impl LayoutPlan {
    /// Total canvas pixel count.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Size of a `width x height` image after aspect-preserving scaling.
///
/// `vertical` fixes the width to `target_width`; the other directions fix the
/// height to `target_height`. The free side is rounded to the nearest pixel
/// and never drops below 1.
pub fn scaled_size(
    width: u32,
    height: u32,
    options: &LayoutOptions,
) -> PipelineResult<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(PipelineError::EmptyImage {
            stage: "layout",
            width,
            height,
        });
    }
    Ok(match options.direction {
        Direction::Vertical => {
            let target = options.target_width;
            (target, scale_side(height, target, width))
        }
        Direction::Horizontal | Direction::Horizontal2x => {
            let target = options.target_height;
            (scale_side(width, target, height), target)
        }
    })
}

/// `round(side * numer / denom)`, at least 1.
fn scale_side(side: u32, numer: u32, denom: u32) -> u32 {
    let (side, numer, denom) = (side as u64, numer as u64, denom as u64);
    let scaled = (2 * side * numer + denom) / (2 * denom);
    scaled.clamp(1, u32::MAX as u64) as u32
}

/// Compute the full layout for images of the given (unscaled) sizes.
pub fn plan(sizes: &[(u32, u32)], options: &LayoutOptions) -> PipelineResult<LayoutPlan> {
    if sizes.is_empty() {
        return Err(PipelineError::EmptyBatch);
    }
    let scaled = sizes
        .iter()
        .map(|&(w, h)| scaled_size(w, h, options))
        .collect::<PipelineResult<Vec<_>>>()?;

    let spacing = options.spacing as u64;
    let (width, height, placements) = match options.direction {
        Direction::Vertical => plan_vertical(&scaled, spacing, options.alignment),
        Direction::Horizontal => plan_horizontal(&scaled, spacing, options.alignment),
        Direction::Horizontal2x => plan_grid(&scaled, spacing, options.alignment),
    };

    let fits = |v: u64| u32::try_from(v).ok();
    match (fits(width), fits(height)) {
        (Some(width), Some(height)) => Ok(LayoutPlan {
            width,
            height,
            placements,
        }),
        _ => Err(PipelineError::CanvasTooLarge {
            width,
            height,
            max_pixels: u32::MAX as u64,
        }),
    }
}

type Planned = (u64, u64, Vec<Placement>);

fn place(x: u64, y: u64, (width, height): (u32, u32)) -> Placement {
    Placement {
        x: x as u32,
        y: y as u32,
        width,
        height,
    }
}

/// Offset of an item of `size` within a slot of `slot` pixels.
fn align(alignment: Alignment, slot: u64, size: u64) -> u64 {
    match alignment {
        Alignment::Left => 0,
        Alignment::Center => (slot - size) / 2,
        Alignment::Right => slot - size,
    }
}

fn gaps(count: usize, spacing: u64) -> u64 {
    spacing * count.saturating_sub(1) as u64
}

fn plan_vertical(scaled: &[(u32, u32)], spacing: u64, alignment: Alignment) -> Planned {
    let width = scaled.iter().map(|s| s.0 as u64).max().unwrap_or(0);
    let height = scaled.iter().map(|s| s.1 as u64).sum::<u64>() + gaps(scaled.len(), spacing);

    let mut y = 0u64;
    let placements = scaled
        .iter()
        .map(|&size| {
            let x = align(alignment, width, size.0 as u64);
            let p = place(x, y, size);
            y += size.1 as u64 + spacing;
            p
        })
        .collect();
    (width, height, placements)
}

fn plan_horizontal(scaled: &[(u32, u32)], spacing: u64, alignment: Alignment) -> Planned {
    let height = scaled.iter().map(|s| s.1 as u64).max().unwrap_or(0);
    let width = scaled.iter().map(|s| s.0 as u64).sum::<u64>() + gaps(scaled.len(), spacing);

    let mut x = 0u64;
    let placements = scaled
        .iter()
        .map(|&size| {
            // Center deliberately maps to the top edge in this direction.
            let y = match alignment {
                Alignment::Left | Alignment::Center => 0,
                Alignment::Right => height - size.1 as u64,
            };
            let p = place(x, y, size);
            x += size.0 as u64 + spacing;
            p
        })
        .collect();
    (width, height, placements)
}

fn plan_grid(scaled: &[(u32, u32)], spacing: u64, alignment: Alignment) -> Planned {
    let column_width = |parity: usize| {
        scaled
            .iter()
            .skip(parity)
            .step_by(2)
            .map(|s| s.0 as u64)
            .max()
            .unwrap_or(0)
    };
    let columns = [column_width(0), column_width(1)];
    let column_x = [0, columns[0] + spacing];

    let row_heights: Vec<u64> = scaled
        .chunks(2)
        .map(|row| row.iter().map(|s| s.1 as u64).max().unwrap_or(0))
        .collect();

    let width = columns[0] + columns[1] + spacing;
    let height = row_heights.iter().sum::<u64>() + gaps(row_heights.len(), spacing);

    let mut placements = Vec::with_capacity(scaled.len());
    let mut row_top = 0u64;
    for (row, &row_height) in scaled.chunks(2).zip(&row_heights) {
        for (col, &size) in row.iter().enumerate() {
            let x = column_x[col] + align(alignment, columns[col], size.0 as u64);
            let y = row_top + (row_height - size.1 as u64) / 2;
            placements.push(place(x, y, size));
        }
        row_top += row_height + spacing;
    }
    (width, height, placements)
}

/// Resize `images` to their planned sizes and paste them onto a new canvas.
///
/// `images` must be in the same order as `plan.placements`.
pub fn compose(
    images: Vec<RgbaImage>,
    plan: &LayoutPlan,
    background: image::Rgba<u8>,
) -> PipelineResult<RgbaImage> {
    if images.len() != plan.placements.len() {
        return Err(PipelineError::Worker(format!(
            "layout planned {} images but received {}",
            plan.placements.len(),
            images.len()
        )));
    }

    let resized: Vec<RgbaImage> = images
        .into_par_iter()
        .zip(plan.placements.par_iter())
        .map(|(image, p)| {
            if image.dimensions() == (p.width, p.height) {
                image
            } else {
                imageops::resize(&image, p.width, p.height, FilterType::Lanczos3)
            }
        })
        .collect();

    let mut canvas = RgbaImage::from_pixel(plan.width, plan.height, background);
    for (image, p) in resized.iter().zip(&plan.placements) {
        paste_masked(&mut canvas, image, p.x, p.y);
    }
    tracing::trace!(
        "Composited {} images onto {}x{} canvas",
        resized.len(),
        plan.width,
        plan.height
    );
    Ok(canvas)
}

/// Plan and compose in one step.
pub fn layout(
    images: Vec<RgbaImage>,
    options: &LayoutOptions,
) -> PipelineResult<(RgbaImage, LayoutPlan)> {
    let sizes: Vec<(u32, u32)> = images.iter().map(|i| i.dimensions()).collect();
    let plan = plan(&sizes, options)?;
    let canvas = compose(images, &plan, options.background)?;
    Ok((canvas, plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn options(direction: Direction, alignment: Alignment, spacing: u32) -> LayoutOptions {
        LayoutOptions {
            direction,
            alignment,
            spacing,
            target_width: 100,
            target_height: 100,
            ..Default::default()
        }
    }

    fn assert_within(plan: &LayoutPlan) {
        for p in &plan.placements {
            assert!(p.x + p.width <= plan.width, "{p:?} exceeds width {}", plan.width);
            assert!(p.y + p.height <= plan.height, "{p:?} exceeds height {}", plan.height);
        }
    }

    #[test]
    fn test_scaled_size_rounds_to_nearest() {
        let opts = options(Direction::Vertical, Alignment::Left, 0);
        // 333 * 100 / 200 = 166.5 -> 167
        assert_eq!(scaled_size(200, 333, &opts).unwrap(), (100, 167));
        // 1 * 100 / 1000 = 0.1 -> clamped to 1
        assert_eq!(scaled_size(1000, 1, &opts).unwrap(), (100, 1));

        let opts = options(Direction::Horizontal, Alignment::Left, 0);
        assert_eq!(scaled_size(300, 200, &opts).unwrap(), (150, 100));
    }

    #[test]
    fn test_scaled_size_rejects_empty() {
        let opts = options(Direction::Vertical, Alignment::Left, 0);
        let err = scaled_size(0, 10, &opts).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyImage { stage: "layout", .. }));
    }

    #[test]
    fn test_empty_batch() {
        let opts = LayoutOptions::default();
        assert!(matches!(plan(&[], &opts), Err(PipelineError::EmptyBatch)));
    }

    #[test]
    fn test_vertical_stacks_with_spacing() {
        let opts = LayoutOptions {
            target_width: 400,
            spacing: 10,
            ..Default::default()
        };
        let plan = plan(&[(400, 600), (400, 300)], &opts).unwrap();
        assert_eq!((plan.width, plan.height), (400, 910));
        assert_eq!((plan.placements[0].x, plan.placements[0].y), (0, 0));
        assert_eq!((plan.placements[1].x, plan.placements[1].y), (0, 610));
        assert_within(&plan);
    }

    #[test]
    fn test_alignment_offsets() {
        assert_eq!(align(Alignment::Left, 100, 40), 0);
        assert_eq!(align(Alignment::Center, 100, 41), 29);
        assert_eq!(align(Alignment::Right, 100, 40), 60);
    }

    #[test]
    fn test_vertical_alignment_with_common_width() {
        // Every image is scaled to the target width, so it fills the canvas.
        for alignment in [Alignment::Left, Alignment::Center, Alignment::Right] {
            let plan = plan(
                &[(200, 100), (100, 100)],
                &options(Direction::Vertical, alignment, 4),
            )
            .unwrap();
            assert_eq!(plan.width, 100);
            assert!(plan.placements.iter().all(|p| p.x == 0));
            assert_eq!(plan.height, 50 + 100 + 4);
        }
    }

    #[test]
    fn test_vertical_spans_do_not_overlap() {
        let sizes = [(50, 80), (100, 30), (70, 70)];
        let plan = plan(&sizes, &options(Direction::Vertical, Alignment::Center, 7)).unwrap();
        let heights: u32 = plan.placements.iter().map(|p| p.height).sum();
        assert_eq!(plan.height, heights + 7 * 2);
        for pair in plan.placements.windows(2) {
            assert!(pair[0].y + pair[0].height + 7 == pair[1].y);
        }
        assert_within(&plan);
    }

    #[test]
    fn test_horizontal_center_aliases_top() {
        let sizes = [(100, 100), (100, 50)];
        let top = plan(&sizes, &options(Direction::Horizontal, Alignment::Left, 5)).unwrap();
        let center = plan(&sizes, &options(Direction::Horizontal, Alignment::Center, 5)).unwrap();
        assert_eq!(top, center);
        assert!(center.placements.iter().all(|p| p.y == 0));
        assert_eq!(center.width, 100 + 200 + 5);
        assert_eq!(center.height, 100);
        assert_within(&center);
    }

    #[test]
    fn test_horizontal_placements_advance_by_width() {
        let sizes = [(100, 100), (100, 50), (50, 100)];
        let plan = plan(&sizes, &options(Direction::Horizontal, Alignment::Right, 3)).unwrap();
        let xs: Vec<u32> = plan.placements.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 103, 306]);
        assert_eq!(plan.width, 100 + 200 + 50 + 3 * 2);
        assert_within(&plan);
    }

    #[test]
    fn test_grid_with_five_images() {
        // Heights are all scaled to 100; widths follow the aspect ratio.
        let sizes = [(100, 100), (200, 100), (50, 100), (150, 100), (120, 100)];
        let spacing = 6;
        let plan = plan(
            &sizes,
            &options(Direction::Horizontal2x, Alignment::Left, spacing),
        )
        .unwrap();

        let col0 = [100, 50, 120].into_iter().max().unwrap();
        let col1 = [200, 150].into_iter().max().unwrap();
        assert_eq!(plan.width, col0 + col1 + spacing);
        assert_eq!(plan.height, 100 * 3 + 2 * spacing);

        // Last row holds image 4 alone.
        let last = plan.placements[4];
        assert_eq!((last.x, last.y), (0, 2 * (100 + spacing)));
        assert_eq!(plan.placements[1].x, col0 + spacing);
        assert_within(&plan);
    }

    #[test]
    fn test_grid_row_height_and_vertical_centering() {
        let opts = LayoutOptions {
            direction: Direction::Horizontal2x,
            target_height: 60,
            spacing: 2,
            alignment: Alignment::Center,
            ..Default::default()
        };
        let plan = plan(&[(60, 60), (30, 60), (90, 60)], &opts).unwrap();
        assert_eq!(plan.height, 60 + 60 + 2);
        // col0 = max(60, 90), col1 = 30
        assert_eq!(plan.width, 90 + 30 + 2);
        // Image 0 is centred in a 90px column.
        assert_eq!(plan.placements[0].x, 15);
        assert_eq!(plan.placements[1].x, 92);
        assert_eq!(plan.placements[2].y, 62);
        assert_within(&plan);
    }

    #[test]
    fn test_grid_right_alignment_per_column() {
        let opts = options(Direction::Horizontal2x, Alignment::Right, 4);
        let plan = plan(&[(50, 100), (100, 100), (100, 100), (50, 100)], &opts).unwrap();
        // col0 = 100, col1 = 100
        assert_eq!(plan.placements[0].x, 50);
        assert_eq!(plan.placements[1].x, 104);
        assert_eq!(plan.placements[3].x, 104 + 50);
        assert_within(&plan);
    }

    #[test]
    fn test_compose_uses_background_and_alpha() {
        let opts = LayoutOptions {
            direction: Direction::Horizontal,
            target_height: 4,
            spacing: 2,
            background: Rgba([0, 0, 255, 255]),
            ..Default::default()
        };
        let red = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let clear = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 0]));
        let (canvas, plan) = layout(vec![red, clear], &opts).unwrap();

        assert_eq!(canvas.dimensions(), (10, 4));
        assert_eq!(plan.placements[1].x, 6);
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        // Gap and fully transparent image both show the background.
        assert_eq!(*canvas.get_pixel(4, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*canvas.get_pixel(8, 2), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_compose_resizes_to_plan() {
        let opts = LayoutOptions {
            target_width: 20,
            spacing: 0,
            ..Default::default()
        };
        let img = RgbaImage::from_pixel(40, 10, Rgba([10, 10, 10, 255]));
        let (canvas, plan) = layout(vec![img], &opts).unwrap();
        assert_eq!(canvas.dimensions(), (20, 5));
        assert_eq!(plan.placements[0].height, 5);
    }

    #[test]
    fn test_compose_rejects_mismatched_batch() {
        let plan = LayoutPlan {
            width: 1,
            height: 1,
            placements: vec![],
        };
        let err = compose(vec![RgbaImage::new(1, 1)], &plan, Rgba([0, 0, 0, 0])).unwrap_err();
        assert!(err.to_string().contains("planned 0"));
    }
}
