//! Acquisition Reader
//!
//! Reads fixed-stride scans out of a data-acquisition device's ring buffer,
//! aligns channel families for the ADC conversion delay, and converts raw codes
//! into physical values.
//!
//! The device is reached through the [`DeviceChannel`] trait. [`AcquisitionReader`]
//! is synchronous and never blocks; [`PollLoop`] drives it from a tokio task.

mod config;
mod decode;
mod device;
mod error;
mod fake;
mod logging;
mod poll;
mod reader;

pub use crate::config::{ChannelScalingConfig, ReaderConfig};
pub use decode::{ChannelSamples, ChannelScaling, ChannelValues, DecodeMode, DelayCoupling, SampleBlock};
pub use device::DeviceChannel;
pub use error::{DeviceError, ReaderError};
pub use fake::FakeDevice;
pub use logging::{init_json_logging, init_logging};
pub use poll::{PollLoop, PollStats};
pub use reader::{AcquisitionReader, ReaderState};

pub use ring_buffer::RingBufferGeometry;
pub use scan_layout::{ChannelKind, ScanLayout, ScanLayoutParser};
pub use scan_scaling::{RangeSpan, ScaleTransform};
