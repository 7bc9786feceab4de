//! Ring Buffer Error Types

use thiserror::Error;

/// Errors from cursor arithmetic and ring access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Geometry violates the ring invariants
    #[error("Invalid ring geometry: {0}")]
    InvalidGeometry(String),

    /// Advance by a byte count that is not a whole number of scans
    #[error("Misaligned read: {bytes} bytes is not a multiple of the {stride}-byte scan")]
    MisalignedRead { bytes: u64, stride: u64 },

    /// Cursor position outside the ring region
    #[error("Position {position} outside ring region {start}..{end}")]
    PositionOutOfRange { position: u64, start: u64, end: u64 },

    /// Single advance longer than the ring
    #[error("Advance of {bytes} bytes exceeds the {total}-byte ring")]
    AdvanceTooLarge { bytes: u64, total: u64 },

    /// Not more samples available than the ADC delay; retry later
    #[error("Insufficient samples: {available} available, ADC delay {delay}")]
    InsufficientSamples { available: i64, delay: i64 },

    /// ADC delay is negative
    #[error("Invalid ADC delay: {0}")]
    InvalidDelay(i64),

    /// Byte view is shorter than the ring
    #[error("Ring view has {len} bytes, geometry needs {total}")]
    RegionTooSmall { len: usize, total: u64 },

    /// Scan at this position would run past the ring end
    #[error("Scan at position {position} runs past the ring end")]
    ScanOutOfBounds { position: u64 },
}

impl BufferError {
    /// Whether the condition clears on its own once more data arrives
    pub fn is_transient(&self) -> bool {
        matches!(self, BufferError::InsufficientSamples { .. })
    }
}
