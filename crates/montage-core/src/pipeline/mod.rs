//! Image compositing pipeline components.
//!
//! This module contains all the stages of the merge pipeline:
//! - **decode**: Base64 payloads to bytes, bytes to RGBA pixels
//! - **enhance**: Upscale, optionally sharpen, downscale
//! - **rotate**: Lossless quarter turns, bicubic arbitrary angles
//! - **border**: Solid frame around each image
//! - **layout**: Scale to a common dimension and place on a canvas
//! - **finalize**: Unsharp mask plus contrast on the whole canvas
//! - **encode**: Canvas to PNG / JPEG / WebP / GIF / BMP / TIFF bytes
//! - **processor**: Orchestrates the full pipeline

pub mod border;
pub mod composite;
pub mod decode;
pub mod encode;
pub mod enhance;
pub mod finalize;
pub mod layout;
pub mod processor;
pub mod rotate;

// Re-exports for convenient access
pub use decode::{decode_base64, DecodedImage, ImageDecoder};
pub use encode::EncodedImage;
pub use layout::{LayoutPlan, Placement};
pub use processor::MergeProcessor;
