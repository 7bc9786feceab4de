//! Acquisition Error Types

use crate::reader::ReaderState;
use ring_buffer::BufferError;
use scan_layout::LayoutError;
use scan_scaling::ScaleError;
use thiserror::Error;

/// Errors reported by a device implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Producer overwrote unread scans
    #[error("Device ring buffer overrun")]
    Overrun,

    /// Device is not open or has gone away
    #[error("Device not connected")]
    NotConnected,

    /// Driver call failed with a status code
    #[error("Driver error {code}: {message}")]
    Driver { code: i32, message: String },

    /// Request the device cannot satisfy
    #[error("Invalid device request: {0}")]
    InvalidRequest(String),
}

/// Errors from the acquisition reader
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Scaling setup failed
    #[error("Scaling error: {0}")]
    Scale(#[from] ScaleError),

    /// Scan descriptor or field extraction failed
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Ring cursor or view failed
    #[error("Ring buffer error: {0}")]
    Buffer(BufferError),

    /// Not more scans buffered than the ADC delay; poll again later
    #[error("Insufficient samples: {available} available, ADC delay {delay}")]
    InsufficientSamples { available: i64, delay: i64 },

    /// Device reported an overrun; acknowledge before reading again
    #[error("Buffer overrun, acknowledgment required")]
    BufferOverrun,

    /// Device call failed
    #[error("Device error: {0}")]
    Device(DeviceError),

    /// Operation not allowed in the current state
    #[error("Cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: ReaderState,
    },

    /// Descriptor scan size differs from the ring stride
    #[error("Scan descriptor describes {scan_bytes}-byte scans, ring stride is {stride} bytes")]
    LayoutMismatch { scan_bytes: usize, stride: u64 },

    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Settings loaded but are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ReaderError {
    /// Whether retrying after the polling interval will succeed without intervention
    pub fn is_transient(&self) -> bool {
        matches!(self, ReaderError::InsufficientSamples { .. })
    }

    /// Whether the reader can continue after `acknowledge_overrun`
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReaderError::BufferOverrun)
    }
}

impl From<BufferError> for ReaderError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::InsufficientSamples { available, delay } => {
                ReaderError::InsufficientSamples { available, delay }
            }
            other => ReaderError::Buffer(other),
        }
    }
}

impl From<DeviceError> for ReaderError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::Overrun => ReaderError::BufferOverrun,
            other => ReaderError::Device(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let insufficient: ReaderError = BufferError::InsufficientSamples {
            available: 2,
            delay: 3,
        }
        .into();
        assert!(insufficient.is_transient());
        assert!(!insufficient.is_recoverable());

        let overrun: ReaderError = DeviceError::Overrun.into();
        assert!(overrun.is_recoverable());
        assert!(!overrun.is_transient());

        let misaligned: ReaderError = BufferError::MisalignedRead { bytes: 3, stride: 8 }.into();
        assert!(matches!(misaligned, ReaderError::Buffer(_)));
        assert!(!misaligned.is_transient());
    }

    #[test]
    fn test_device_error_passthrough() {
        let err: ReaderError = DeviceError::NotConnected.into();
        assert!(matches!(err, ReaderError::Device(DeviceError::NotConnected)));
        assert_eq!(err.to_string(), "Device error: Device not connected");
    }
}
