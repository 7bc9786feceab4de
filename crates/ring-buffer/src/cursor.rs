//! Wraparound-Safe Read Cursor

use crate::error::BufferError;
use crate::geometry::RingBufferGeometry;

/// Read position inside the ring region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadCursor {
    /// Absolute offset as reported by the device
    pub position: u64,
}

impl ReadCursor {
    /// Create a cursor at the given position
    pub fn new(position: u64) -> Self {
        Self { position }
    }
}

/// Cursor that walks a ring of fixed-stride scans
#[derive(Debug, Clone, Copy)]
pub struct RingBufferCursor {
    geometry: RingBufferGeometry,
    cursor: ReadCursor,
}

impl RingBufferCursor {
    /// Create a cursor at a position inside the ring
    pub fn new(geometry: RingBufferGeometry, cursor: ReadCursor) -> Result<Self, BufferError> {
        if !geometry.contains(cursor.position) {
            return Err(BufferError::PositionOutOfRange {
                position: cursor.position,
                start: geometry.start_offset(),
                end: geometry.end_offset(),
            });
        }
        Ok(Self { geometry, cursor })
    }

    /// Advance by whole scans and return the new position
    pub fn advance(&mut self, scans: u32) -> Result<u64, BufferError> {
        let bytes = (scans as u64).saturating_mul(self.geometry.scan_stride_bytes());
        self.advance_bytes(bytes)
    }

    /// Advance by a byte count that must be a whole number of scans
    pub fn advance_bytes(&mut self, bytes: u64) -> Result<u64, BufferError> {
        let stride = self.geometry.scan_stride_bytes();
        if bytes % stride != 0 {
            return Err(BufferError::MisalignedRead { bytes, stride });
        }
        // A single correction only restores the invariant up to one full ring
        if bytes > self.geometry.total_size() {
            return Err(BufferError::AdvanceTooLarge {
                bytes,
                total: self.geometry.total_size(),
            });
        }

        self.cursor.position += bytes;
        self.wrap_if_needed();
        Ok(self.cursor.position)
    }

    /// Pull the position back into the ring after it ran past the end
    pub fn wrap_if_needed(&mut self) {
        if self.cursor.position >= self.geometry.end_offset() {
            self.cursor.position -= self.geometry.total_size();
        }
    }

    /// Start positions of the next `scans` scans, without moving this cursor
    pub fn scan_positions(&self, scans: u32) -> ScanPositions {
        ScanPositions {
            cursor: *self,
            remaining: scans,
        }
    }

    /// Current position
    pub fn position(&self) -> u64 {
        self.cursor.position
    }

    /// Current cursor value
    pub fn cursor(&self) -> ReadCursor {
        self.cursor
    }

    /// Ring geometry
    pub fn geometry(&self) -> &RingBufferGeometry {
        &self.geometry
    }
}

/// Iterator over successive scan start positions, wrapping at the ring end
#[derive(Debug, Clone)]
pub struct ScanPositions {
    cursor: RingBufferCursor,
    remaining: u32,
}

impl Iterator for ScanPositions {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let position = self.cursor.position();
        // Stride never exceeds the ring size, so one wrap suffices
        self.cursor.cursor.position += self.cursor.geometry.scan_stride_bytes();
        self.cursor.wrap_if_needed();
        Some(position)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for ScanPositions {}
