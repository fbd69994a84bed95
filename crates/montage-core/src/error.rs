//! Error types for the Montage compositing pipeline.
//!
//! Errors are organized by stage so that a failure can always be traced back
//! to where it happened (decode, option resolution, geometry, storage), even
//! though the HTTP boundary reports every failure with the same response shape.

use thiserror::Error;

/// Top-level error type for Montage operations.
#[derive(Error, Debug)]
pub enum MontageError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Storage backend construction errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Color string parse failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("malformed hex color '{0}' (expected #RRGGBB or #RRGGBBAA)")]
    MalformedHex(String),

    #[error("unknown color name '{0}'")]
    UnknownName(String),

    #[error("color arrays need 3 or 4 channels, got {0}")]
    ChannelCount(usize),
}

/// Object store failures.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload of {key} rejected with status {status}")]
    Rejected { key: String, status: u16 },

    #[error("Storage misconfigured: {0}")]
    Misconfigured(String),
}

/// Coarse classification of a [`PipelineError`].
///
/// The boundary collapses every kind into one response, but the kind is
/// logged and is what tests assert on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed base64 or unreadable image bytes
    Decode,
    /// Malformed colors, out-of-range options, limit violations
    Parameter,
    /// Zero-area images reaching a resampling stage
    Geometry,
    /// Encoding or persisting the result failed
    Storage,
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Request body could not be parsed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Base64 payload could not be decoded
    #[error("Image {index}: invalid base64 payload: {message}")]
    Base64 { index: usize, message: String },

    /// Image bytes could not be decoded
    #[error("Image {index}: decode error: {message}")]
    Decode { index: usize, message: String },

    /// An option value is out of range or unrecognized
    #[error("Invalid option {name}: {message}")]
    InvalidOption { name: &'static str, message: String },

    /// A color option failed to parse
    #[error("Invalid {name}: {source}")]
    InvalidColor {
        name: &'static str,
        #[source]
        source: ColorError,
    },

    /// The request carried no images
    #[error("No images to merge")]
    EmptyBatch,

    /// Too many images in one request
    #[error("Too many images: {count} > {max}")]
    TooManyImages { count: usize, max: usize },

    /// Image dimensions exceed limit
    #[error("Image {index} too large: {width}x{height} > {max_dim}")]
    ImageTooLarge {
        index: usize,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Computed canvas exceeds the configured pixel budget
    #[error("Canvas {width}x{height} exceeds the limit of {max_pixels} pixels")]
    CanvasTooLarge {
        width: u64,
        height: u64,
        max_pixels: u64,
    },

    /// A zero-area image reached a stage that needs pixels
    #[error("Degenerate {width}x{height} image in {stage} stage")]
    EmptyImage {
        stage: &'static str,
        width: u32,
        height: u32,
    },

    /// Encoding the canvas failed
    #[error("Failed to encode {format}: {message}")]
    Encode { format: String, message: String },

    /// Persisting the encoded result failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Worker setup or join failure
    #[error("Worker error: {0}")]
    Worker(String),
}

impl PipelineError {
    /// Which stage family produced this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Base64 { .. } | Self::Decode { .. } | Self::InvalidRequest(_) => {
                ErrorKind::Decode
            }
            Self::InvalidOption { .. }
            | Self::InvalidColor { .. }
            | Self::EmptyBatch
            | Self::TooManyImages { .. }
            | Self::ImageTooLarge { .. }
            | Self::CanvasTooLarge { .. } => ErrorKind::Parameter,
            Self::EmptyImage { .. } => ErrorKind::Geometry,
            Self::Encode { .. } | Self::Storage(_) | Self::Worker(_) => ErrorKind::Storage,
        }
    }
}

/// Convenience type alias for Montage results.
pub type Result<T> = std::result::Result<T, MontageError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinguishable() {
        let color = PipelineError::InvalidColor {
            name: "borderColor",
            source: ColorError::MalformedHex("#zz".into()),
        };
        let storage = PipelineError::Storage(StorageError::Rejected {
            key: "merged/a.png".into(),
            status: 503,
        });
        assert_eq!(color.kind(), ErrorKind::Parameter);
        assert_eq!(storage.kind(), ErrorKind::Storage);
        assert_ne!(color.kind(), storage.kind());
    }

    #[test]
    fn test_geometry_kind() {
        let err = PipelineError::EmptyImage {
            stage: "enhance",
            width: 0,
            height: 4,
        };
        assert_eq!(err.kind(), ErrorKind::Geometry);
        assert!(err.to_string().contains("enhance"));
    }

    #[test]
    fn test_color_error_message_keeps_input() {
        let err = PipelineError::InvalidColor {
            name: "borderColor",
            source: ColorError::MalformedHex("#12345".into()),
        };
        assert!(err.to_string().contains("#12345"));
    }
}
