//! Ring Buffer Geometry

use crate::error::BufferError;
use serde::Serialize;

/// Layout of the device's circular scan region
///
/// Offsets are the pointers the device reports. The ring occupies
/// `start_offset..end_offset` and `end_offset - start_offset == total_size`,
/// so a region addressed from zero has `end_offset == total_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RingBufferGeometry {
    start_offset: u64,
    end_offset: u64,
    total_size: u64,
    scan_stride_bytes: u64,
}

impl RingBufferGeometry {
    /// Validate and create a geometry
    pub fn new(
        start_offset: u64,
        end_offset: u64,
        total_size: u64,
        scan_stride_bytes: u64,
    ) -> Result<Self, BufferError> {
        if start_offset >= end_offset {
            return Err(BufferError::InvalidGeometry(format!(
                "start {} must be below end {}",
                start_offset, end_offset
            )));
        }
        if end_offset - start_offset != total_size {
            return Err(BufferError::InvalidGeometry(format!(
                "region {}..{} does not span {} bytes",
                start_offset, end_offset, total_size
            )));
        }
        if scan_stride_bytes == 0 {
            return Err(BufferError::InvalidGeometry("scan stride is zero".to_string()));
        }
        if total_size % scan_stride_bytes != 0 {
            return Err(BufferError::InvalidGeometry(format!(
                "{}-byte ring is not a whole number of {}-byte scans",
                total_size, scan_stride_bytes
            )));
        }

        Ok(Self {
            start_offset,
            end_offset,
            total_size,
            scan_stride_bytes,
        })
    }

    /// Geometry of a zero-based ring holding `scans` scans
    pub fn zero_based(scans: u64, scan_stride_bytes: u64) -> Result<Self, BufferError> {
        let total = scans.checked_mul(scan_stride_bytes).ok_or_else(|| {
            BufferError::InvalidGeometry(format!("{} scans of {} bytes overflow", scans, scan_stride_bytes))
        })?;
        Self::new(0, total, total, scan_stride_bytes)
    }

    /// First byte of the ring
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// One past the last byte of the ring
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    /// Ring size in bytes
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Bytes per scan
    pub fn scan_stride_bytes(&self) -> u64 {
        self.scan_stride_bytes
    }

    /// Number of scans the ring holds
    pub fn capacity_scans(&self) -> u64 {
        self.total_size / self.scan_stride_bytes
    }

    /// Whether a position lies inside the ring
    pub fn contains(&self, position: u64) -> bool {
        (self.start_offset..self.end_offset).contains(&position)
    }
}
