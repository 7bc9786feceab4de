//! Device Query Surface
//!
//! Everything the reader needs from the acquisition driver, as one trait.
//! Implementations wrap a real driver session or, in tests, [`crate::FakeDevice`].

use crate::error::DeviceError;
use ring_buffer::RingBufferGeometry;

/// Access to one device's scan ring and its bookkeeping
pub trait DeviceChannel {
    /// Scans written by the device and not yet freed
    ///
    /// Returns [`DeviceError::Overrun`] while an overrun is pending.
    fn available_samples(&self) -> Result<i64, DeviceError>;

    /// Position of the oldest unfreed scan
    fn read_position(&self) -> Result<u64, DeviceError>;

    /// Layout of the ring region
    fn geometry(&self) -> Result<RingBufferGeometry, DeviceError>;

    /// Scans by which analog samples trail the rest of the scan
    fn adc_delay(&self) -> Result<i64, DeviceError>;

    /// Scan descriptor document, as owned bytes
    fn scan_descriptor(&self) -> Result<Vec<u8>, DeviceError>;

    /// Bytes of the ring region; index 0 is the geometry's start offset
    fn ring(&self) -> &[u8];

    /// Hand `count` scans back to the device
    fn free_samples(&mut self, count: u64) -> Result<(), DeviceError>;

    /// Clear a pending overrun
    fn acknowledge_overrun(&mut self) -> Result<(), DeviceError>;
}
