//! Bounds-Checked Ring Access

use crate::error::BufferError;
use crate::geometry::RingBufferGeometry;

/// Borrowed view of the ring's bytes, addressed by device positions
#[derive(Debug, Clone, Copy)]
pub struct RingView<'a> {
    geometry: RingBufferGeometry,
    bytes: &'a [u8],
}

impl<'a> RingView<'a> {
    /// Wrap the ring bytes; `bytes[0]` is the byte at `start_offset`
    pub fn new(geometry: RingBufferGeometry, bytes: &'a [u8]) -> Result<Self, BufferError> {
        if (bytes.len() as u64) < geometry.total_size() {
            return Err(BufferError::RegionTooSmall {
                len: bytes.len(),
                total: geometry.total_size(),
            });
        }
        Ok(Self { geometry, bytes })
    }

    /// Bytes of the scan starting at `position`
    pub fn scan_at(&self, position: u64) -> Result<&'a [u8], BufferError> {
        if !self.geometry.contains(position) {
            return Err(BufferError::PositionOutOfRange {
                position,
                start: self.geometry.start_offset(),
                end: self.geometry.end_offset(),
            });
        }

        let start = (position - self.geometry.start_offset()) as usize;
        let end = start + self.geometry.scan_stride_bytes() as usize;
        if end as u64 > self.geometry.total_size() {
            return Err(BufferError::ScanOutOfBounds { position });
        }
        Ok(&self.bytes[start..end])
    }

    /// Ring geometry
    pub fn geometry(&self) -> &RingBufferGeometry {
        &self.geometry
    }
}
