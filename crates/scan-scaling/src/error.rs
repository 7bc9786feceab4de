//! Scaling Error Types

use thiserror::Error;

/// Configuration errors raised while building or applying a scale
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScaleError {
    /// Range is empty or inverted
    #[error("Invalid range: max {max} must be greater than min {min}")]
    InvalidRange { min: f64, max: f64 },

    /// Bit width is not one of 16, 24 or 32
    #[error("Unsupported sample width: {0} bits")]
    UnsupportedWidth(u8),

    /// Embedded bit offset does not fit a 32-bit container
    #[error("Embedded bit offset {0} exceeds the 32-bit container")]
    InvalidBitOffset(u8),

    /// Range property text could not be parsed
    #[error("Invalid range text: {0:?}")]
    InvalidRangeText(String),
}
