//! Scan Layout Error Types

use thiserror::Error;

/// Errors while reading a scan descriptor or a channel field
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Descriptor declares a version other than the supported one
    #[error("Unsupported scan descriptor version: {0}")]
    UnsupportedVersion(String),

    /// Descriptor is structurally invalid
    #[error("Scan descriptor parse error: {0}")]
    ParseError(String),

    /// Descriptor is not well-formed XML
    #[error("Scan descriptor XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Channel field lies outside the scan bytes
    #[error("Channel {channel} needs bytes {start}..{end} but the scan has {available}")]
    FieldOutOfBounds {
        channel: String,
        start: usize,
        end: usize,
        available: usize,
    },

    /// No channel with this name in the layout
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}
