//! ADC Delay Compensation
//!
//! Analog samples reach the ring `delay_samples` scans after the counter and
//! digital samples taken at the same instant. To line them up, analog values are
//! read `delay_samples` scans ahead of the shared read position, and the
//! last `delay_samples` available scans are left for the next poll.

use crate::cursor::{ReadCursor, RingBufferCursor};
use crate::error::BufferError;
use crate::geometry::RingBufferGeometry;
use tracing::trace;

/// Scans that can be decoded now and where the delayed family starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveWindow {
    /// Scans ready for decoding
    pub count: i64,
    /// Read position for the delayed channel family
    pub cursor: ReadCursor,
}

/// Aligns a lagging channel family with the rest of the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdcDelayCompensator {
    delay_samples: i64,
}

impl AdcDelayCompensator {
    /// Create a compensator for the device's ADC delay, in scans
    pub fn new(delay_samples: i64) -> Result<Self, BufferError> {
        if delay_samples < 0 {
            return Err(BufferError::InvalidDelay(delay_samples));
        }
        Ok(Self { delay_samples })
    }

    /// Configured delay in scans
    pub fn delay_samples(&self) -> i64 {
        self.delay_samples
    }

    /// Apply this compensator's delay
    pub fn compensate(
        &self,
        available_samples: i64,
        base_cursor: ReadCursor,
        geometry: &RingBufferGeometry,
    ) -> Result<EffectiveWindow, BufferError> {
        Self::effective(available_samples, self.delay_samples, base_cursor, geometry)
    }

    /// Reduce the available count by the delay and shift the cursor past it
    ///
    /// Returns [`BufferError::InsufficientSamples`] when no more than `delay`
    /// scans are available; that is a normal "poll again later" outcome.
    pub fn effective(
        available_samples: i64,
        delay_samples: i64,
        base_cursor: ReadCursor,
        geometry: &RingBufferGeometry,
    ) -> Result<EffectiveWindow, BufferError> {
        if delay_samples < 0 {
            return Err(BufferError::InvalidDelay(delay_samples));
        }

        let count = available_samples - delay_samples;
        if count <= 0 {
            return Err(BufferError::InsufficientSamples {
                available: available_samples,
                delay: delay_samples,
            });
        }

        let mut cursor = RingBufferCursor::new(*geometry, base_cursor)?;
        let shift = (delay_samples as u64).saturating_mul(geometry.scan_stride_bytes());
        cursor.advance_bytes(shift)?;

        trace!(
            "ADC delay {}: {} of {} scans ready, delayed cursor {}",
            delay_samples,
            count,
            available_samples,
            cursor.position()
        );

        Ok(EffectiveWindow {
            count,
            cursor: cursor.cursor(),
        })
    }
}
