//! Merge options: the typed request surface and its validated form.
//!
//! [`MergeOptions`] mirrors the JSON `options` object (camelCase keys, every
//! default listed once in its `Default` impl). [`MergeOptions::resolve`]
//! validates it into [`MergeSettings`], which is what the pipeline consumes.
//!
//! | Key | Default |
//! |---|---|
//! | `quality` | 95 |
//! | `enhance` | 1.0 |
//! | `borderColor` | `#cccccc` |
//! | `borderWidth` | 0 |
//! | `direction` | `vertical` |
//! | `spacing` | 6 |
//! | `alignment` | `left` |
//! | `targetWidth` | 550 |
//! | `targetHeight` | 800 |
//! | `backgroundColor` | transparent white |
//! | `outputFormat` | `PNG` |

use image::{ImageFormat, Rgba};
use serde::{Deserialize, Serialize};

use crate::color::{parse_color, ColorSpec};
use crate::error::{PipelineError, PipelineResult};

/// How images are arranged on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Stacked top to bottom, all scaled to `targetWidth`
    #[default]
    Vertical,
    /// Left to right, all scaled to `targetHeight`
    Horizontal,
    /// Two-column grid, all scaled to `targetHeight`
    #[serde(rename = "horizontal_2x")]
    Horizontal2x,
}

/// Cross-axis placement. Its meaning depends on [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Encoded output codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
    Bmp,
    Tiff,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tiff" | "tif" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// File extension used in object keys and download names.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn content_type(self) -> String {
        format!("image/{}", self.extension())
    }

    /// Whether the codec can carry the canvas alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg | Self::Bmp)
    }

    pub(crate) fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::WebP => ImageFormat::WebP,
            Self::Gif => ImageFormat::Gif,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    /// Build a quality value, rejecting anything outside 1..=100.
    pub fn new(value: u32) -> Option<Self> {
        (1..=100).contains(&value).then_some(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Widest frame accepted for `borderWidth`, request-wide or per image.
pub const MAX_BORDER_WIDTH: u32 = 4096;

/// Solid frame drawn around each image before layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    pub color: Rgba<u8>,
    pub width: u32,
}

/// Reject border widths above [`MAX_BORDER_WIDTH`].
pub(crate) fn check_border_width(name: &'static str, width: u32) -> PipelineResult<u32> {
    if width > MAX_BORDER_WIDTH {
        return Err(invalid(
            name,
            format!("{width} exceeds the maximum of {MAX_BORDER_WIDTH}"),
        ));
    }
    Ok(width)
}

/// Validated layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    pub direction: Direction,
    pub spacing: u32,
    pub alignment: Alignment,
    pub target_width: u32,
    pub target_height: u32,
    pub background: Rgba<u8>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Vertical,
            spacing: 6,
            alignment: Alignment::Left,
            target_width: 550,
            target_height: 800,
            background: crate::color::TRANSPARENT_WHITE,
        }
    }
}

/// Everything the pipeline needs, already validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeSettings {
    pub layout: LayoutOptions,
    pub quality: Quality,
    pub enhance_factor: f32,
    pub border: Option<Border>,
    pub output_format: OutputFormat,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            quality: Quality::default(),
            enhance_factor: 1.0,
            border: None,
            output_format: OutputFormat::Png,
        }
    }
}

/// The `options` object of a merge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeOptions {
    /// Lossy encoder quality, 1-100
    pub quality: u32,

    /// Sharpening factor for the per-image enhancement pass
    #[serde(rename = "enhance")]
    pub enhance_factor: f32,

    /// Border color (`#RRGGBB`, `#RRGGBBAA` or a color name)
    pub border_color: String,

    /// Border width in pixels, 0 disables the border
    pub border_width: u32,

    pub direction: Direction,

    /// Pixels between neighbouring images
    pub spacing: u32,

    pub alignment: Alignment,

    /// Common width in `vertical` mode
    pub target_width: u32,

    /// Common height in `horizontal` and `horizontal_2x` modes
    pub target_height: u32,

    pub background_color: ColorSpec,

    /// `PNG`, `JPEG`, `WEBP`, `GIF`, `BMP` or `TIFF`
    pub output_format: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            quality: 95,
            enhance_factor: 1.0,
            border_color: "#cccccc".to_string(),
            border_width: 0,
            direction: Direction::Vertical,
            spacing: 6,
            alignment: Alignment::Left,
            target_width: 550,
            target_height: 800,
            background_color: ColorSpec::default(),
            output_format: "PNG".to_string(),
        }
    }
}

impl MergeOptions {
    /// Validate every option and produce the settings the pipeline runs with.
    pub fn resolve(&self) -> PipelineResult<MergeSettings> {
        if self.target_width == 0 {
            return Err(invalid("targetWidth", "must be > 0"));
        }
        if self.target_height == 0 {
            return Err(invalid("targetHeight", "must be > 0"));
        }
        let quality = Quality::new(self.quality)
            .ok_or_else(|| invalid("quality", format!("{} is outside 1-100", self.quality)))?;
        if !self.enhance_factor.is_finite() || self.enhance_factor < 0.0 {
            return Err(invalid(
                "enhance",
                format!("{} must be a finite value >= 0", self.enhance_factor),
            ));
        }
        let output_format = OutputFormat::parse(&self.output_format).ok_or_else(|| {
            invalid(
                "outputFormat",
                format!("unsupported format '{}'", self.output_format),
            )
        })?;

        let border_color =
            parse_color(&self.border_color).map_err(|source| PipelineError::InvalidColor {
                name: "borderColor",
                source,
            })?;
        let background =
            self.background_color
                .resolve()
                .map_err(|source| PipelineError::InvalidColor {
                    name: "backgroundColor",
                    source,
                })?;

        let border_width = check_border_width("borderWidth", self.border_width)?;
        let border = (border_width > 0).then_some(Border {
            color: border_color,
            width: border_width,
        });

        Ok(MergeSettings {
            layout: LayoutOptions {
                direction: self.direction,
                spacing: self.spacing,
                alignment: self.alignment,
                target_width: self.target_width,
                target_height: self.target_height,
                background,
            },
            quality,
            enhance_factor: self.enhance_factor,
            border,
            output_format,
        })
    }
}

fn invalid(name: &'static str, message: impl Into<String>) -> PipelineError {
    PipelineError::InvalidOption {
        name,
        message: message.into(),
    }
}
