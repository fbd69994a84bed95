//! Request and response types exchanged at the boundary.

use serde::{Deserialize, Serialize};

use crate::color::parse_color;
use crate::error::{PipelineError, PipelineResult};
use crate::options::{check_border_width, Border, MergeOptions};

/// One input image as sent by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Base64-encoded image bytes, optionally prefixed with a `data:` URL header
    pub base64: String,

    /// Clockwise rotation in degrees
    #[serde(default)]
    pub rotation: i32,

    /// Border color for this image only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,

    /// Border width for this image only; 0 disables the border here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
}

impl ImageSpec {
    /// The border this image asks for in place of the request-wide one.
    ///
    /// `None` when the image sets neither key. A key the image leaves out
    /// falls back to the request's `borderColor` / `borderWidth`.
    pub fn border_override(&self, options: &MergeOptions) -> PipelineResult<Option<Border>> {
        if self.border_color.is_none() && self.border_width.is_none() {
            return Ok(None);
        }
        let color_text = self.border_color.as_deref().unwrap_or(&options.border_color);
        let color = parse_color(color_text).map_err(|source| PipelineError::InvalidColor {
            name: "image borderColor",
            source,
        })?;
        let width = self.border_width.unwrap_or(options.border_width);
        Ok(Some(Border {
            color,
            width: check_border_width("image borderWidth", width)?,
        }))
    }
}

/// A full merge request: ordered images plus layout/quality options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub images: Vec<ImageSpec>,

    #[serde(default)]
    pub options: MergeOptions,
}

/// Raw image bytes ready for the pipeline, with their position in the batch.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Zero-based position in the request (used in error messages)
    pub index: usize,
    /// Encoded image bytes (any format the decoder recognizes)
    pub bytes: Vec<u8>,
    /// Clockwise rotation in degrees
    pub rotation: i32,
    /// Border replacing the request-wide one for this image
    pub border: Option<Border>,
}

/// Success body: where the merged image can be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResponse {
    pub url: String,
}

/// Failure body: a human-readable message only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Everything known about a stored merge result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Externally reachable address of the stored object
    pub url: String,
    /// Object key inside the store
    pub key: String,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// MIME type of the encoded bytes
    pub content_type: String,
    /// Encoded size in bytes
    pub size_bytes: usize,
}

impl From<&MergeOutcome> for MergeResponse {
    fn from(outcome: &MergeOutcome) -> Self {
        Self {
            url: outcome.url.clone(),
        }
    }
}
