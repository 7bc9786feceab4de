//! In-Memory Device
//!
//! Stands in for a driver session: owns a ring, accepts scans from a simulated
//! producer, and tracks what the reader frees and acknowledges.

use crate::device::DeviceChannel;
use crate::error::DeviceError;
use ring_buffer::{ReadCursor, RingBufferCursor, RingBufferGeometry};
use tracing::{debug, warn};

/// Device backed by a byte vector
#[derive(Debug, Clone)]
pub struct FakeDevice {
    geometry: RingBufferGeometry,
    ring: Vec<u8>,
    descriptor: Vec<u8>,
    adc_delay: i64,
    read: RingBufferCursor,
    write: RingBufferCursor,
    buffered: u64,
    overrun: bool,
    freed: u64,
    acknowledgments: u32,
    dropped: u64,
    fail_next_free: bool,
}

impl FakeDevice {
    /// Create an empty device with the given descriptor document and ring
    pub fn new(descriptor: &str, geometry: RingBufferGeometry) -> Result<Self, DeviceError> {
        let start = ReadCursor::new(geometry.start_offset());
        let cursor = RingBufferCursor::new(geometry, start)
            .map_err(|e| DeviceError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            geometry,
            ring: vec![0; geometry.total_size() as usize],
            descriptor: descriptor.as_bytes().to_vec(),
            adc_delay: 0,
            read: cursor,
            write: cursor,
            buffered: 0,
            overrun: false,
            freed: 0,
            acknowledgments: 0,
            dropped: 0,
            fail_next_free: false,
        })
    }

    /// Set the ADC delay reported to readers
    pub fn with_adc_delay(mut self, delay: i64) -> Self {
        self.adc_delay = delay;
        self
    }

    /// Producer side: append one scan
    ///
    /// Returns `false` and flags an overrun when the ring is full.
    pub fn push_scan(&mut self, scan: &[u8]) -> Result<bool, DeviceError> {
        let stride = self.geometry.scan_stride_bytes();
        if scan.len() as u64 != stride {
            return Err(DeviceError::InvalidRequest(format!(
                "scan of {} bytes, stride is {}",
                scan.len(),
                stride
            )));
        }

        if self.overrun || self.buffered == self.geometry.capacity_scans() {
            if !self.overrun {
                warn!("Fake device ring full, flagging overrun");
            }
            self.overrun = true;
            self.dropped += 1;
            return Ok(false);
        }

        let index = (self.write.position() - self.geometry.start_offset()) as usize;
        self.ring[index..index + scan.len()].copy_from_slice(scan);
        self.write.advance(1).map_err(|e| DeviceError::InvalidRequest(e.to_string()))?;
        self.buffered += 1;
        Ok(true)
    }

    /// Flag an overrun without filling the ring
    pub fn inject_overrun(&mut self) {
        self.overrun = true;
    }

    /// Make the next `free_samples` call fail as if the device went away
    pub fn inject_free_failure(&mut self) {
        self.fail_next_free = true;
    }

    /// Total scans freed by readers
    pub fn freed_samples(&self) -> u64 {
        self.freed
    }

    /// Number of overrun acknowledgments received
    pub fn acknowledgments(&self) -> u32 {
        self.acknowledgments
    }

    /// Scans the producer lost to overruns
    pub fn dropped_scans(&self) -> u64 {
        self.dropped
    }

    /// Whether an overrun is pending
    pub fn is_overrun(&self) -> bool {
        self.overrun
    }
}

impl DeviceChannel for FakeDevice {
    fn available_samples(&self) -> Result<i64, DeviceError> {
        if self.overrun {
            return Err(DeviceError::Overrun);
        }
        Ok(self.buffered as i64)
    }

    fn read_position(&self) -> Result<u64, DeviceError> {
        Ok(self.read.position())
    }

    fn geometry(&self) -> Result<RingBufferGeometry, DeviceError> {
        Ok(self.geometry)
    }

    fn adc_delay(&self) -> Result<i64, DeviceError> {
        Ok(self.adc_delay)
    }

    fn scan_descriptor(&self) -> Result<Vec<u8>, DeviceError> {
        Ok(self.descriptor.clone())
    }

    fn ring(&self) -> &[u8] {
        &self.ring
    }

    fn free_samples(&mut self, count: u64) -> Result<(), DeviceError> {
        if self.fail_next_free {
            self.fail_next_free = false;
            return Err(DeviceError::NotConnected);
        }
        if count > self.buffered {
            return Err(DeviceError::InvalidRequest(format!(
                "free {} scans, only {} buffered",
                count, self.buffered
            )));
        }
        let scans = u32::try_from(count)
            .map_err(|_| DeviceError::InvalidRequest(format!("free count {} too large", count)))?;
        self.read
            .advance(scans)
            .map_err(|e| DeviceError::InvalidRequest(e.to_string()))?;
        self.buffered -= count;
        self.freed += count;
        debug!("Fake device freed {} scans, {} buffered", count, self.buffered);
        Ok(())
    }

    fn acknowledge_overrun(&mut self) -> Result<(), DeviceError> {
        // Unread data is discarded and reading resumes at the producer
        self.overrun = false;
        self.read = self.write;
        self.buffered = 0;
        self.acknowledgments += 1;
        Ok(())
    }
}
