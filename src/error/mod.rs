//! Error types for the image enhancement library.

use thiserror::Error;

use crate::Shape;

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, EnhanceError>;

/// Main error type for the image enhancement library.
#[derive(Error, Debug)]
pub enum EnhanceError {
    /// A pixel buffer has zero samples.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Two buffers differ in width, height, or channel count.
    #[error("Shape mismatch: {left} vs {right}")]
    ShapeMismatch {
        /// Shape of the first (reference) operand.
        left: Shape,
        /// Shape of the second operand.
        right: Shape,
    },

    /// A filter or metric parameter is out of its valid domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A metric could not produce a meaningful score.
    #[error("Degenerate result: {0}")]
    DegenerateResult(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image decode/encode failure.
    #[error("Image format error: {0}")]
    ImageFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The progress handler requested cancellation.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EnhanceError {
    /// Build a shape mismatch error from two shapes.
    pub fn shape_mismatch(left: Shape, right: Shape) -> Self {
        EnhanceError::ShapeMismatch { left, right }
    }

    /// Whether the error was caused by caller-supplied data or parameters
    /// rather than the environment (files, threads).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EnhanceError::EmptyInput(_)
                | EnhanceError::ShapeMismatch { .. }
                | EnhanceError::InvalidParameter(_)
                | EnhanceError::DegenerateResult(_)
        )
    }
}

impl From<image::ImageError> for EnhanceError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => EnhanceError::Io(e),
            other => EnhanceError::ImageFormat(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for EnhanceError {
    fn from(err: toml::de::Error) -> Self {
        EnhanceError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EnhanceError {
    fn from(err: toml::ser::Error) -> Self {
        EnhanceError::Config(err.to_string())
    }
}
