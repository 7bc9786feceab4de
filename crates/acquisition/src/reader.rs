//! Acquisition Reader
//!
//! Drives one device through `Idle → Armed → Running → Draining → Stopped`.
//! Each [`AcquisitionReader::drain`] decodes whatever whole scans the device has
//! buffered, aligned for the ADC delay, and hands them back as a [`SampleBlock`].
//! An overrun moves the reader to `ErrorRecovery` until it is acknowledged.

use crate::config::ReaderConfig;
use crate::decode::{ChannelScaling, DecodeMode, DelayCoupling, SampleBlock, ScanDecoder};
use crate::device::DeviceChannel;
use crate::error::{DeviceError, ReaderError};
use ring_buffer::{AdcDelayCompensator, ReadCursor, RingBufferCursor, RingBufferGeometry, RingView};
use scan_layout::{LayoutError, ScanLayout, ScanLayoutParser};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Reader lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Not configured
    Idle,
    /// Layout and geometry accepted, nothing read yet
    Armed,
    /// At least one block decoded
    Running,
    /// Overrun pending acknowledgment
    ErrorRecovery,
    /// Final drain in progress
    Draining,
    /// Finished; create a new reader to restart
    Stopped,
}

/// Per-acquisition state fixed at arm time
#[derive(Debug)]
struct Session {
    layout: ScanLayout,
    geometry: RingBufferGeometry,
    cursor: RingBufferCursor,
    counter_index: Option<usize>,
}

/// Decodes scans from a device ring
pub struct AcquisitionReader<D: DeviceChannel> {
    device: D,
    state: ReaderState,
    session: Option<Session>,
    scaling: HashMap<String, ChannelScaling>,
    decode_mode: DecodeMode,
    delay_coupling: DelayCoupling,
    auto_release: bool,
    sample_rate_hz: f64,
    sample_counter: Option<String>,
    /// Decoded but not yet freed
    outstanding: u64,
    last_known_sample_index: Option<u32>,
    counter_before_overrun: Option<u32>,
}

impl<D: DeviceChannel> AcquisitionReader<D> {
    /// Create an idle reader
    pub fn new(device: D, config: &ReaderConfig) -> Result<Self, ReaderError> {
        Ok(Self {
            device,
            state: ReaderState::Idle,
            session: None,
            scaling: config.channel_scaling()?,
            decode_mode: config.decode_mode,
            delay_coupling: config.delay_coupling,
            auto_release: config.auto_release,
            sample_rate_hz: config.sample_rate_hz,
            sample_counter: config.sample_counter_channel.clone(),
            outstanding: 0,
            last_known_sample_index: None,
            counter_before_overrun: None,
        })
    }

    /// Set or replace one channel's scaling
    pub fn with_scaling(mut self, channel: impl Into<String>, scaling: ChannelScaling) -> Self {
        self.scaling.insert(channel.into(), scaling);
        self
    }

    /// Accept a layout and ring geometry
    pub fn arm(&mut self, layout: ScanLayout, geometry: RingBufferGeometry) -> Result<(), ReaderError> {
        if self.state != ReaderState::Idle {
            return Err(ReaderError::InvalidState {
                operation: "arm",
                state: self.state,
            });
        }

        let scan_bytes = layout.scan_size_bytes();
        if scan_bytes as u64 != geometry.scan_stride_bytes() {
            return Err(ReaderError::LayoutMismatch {
                scan_bytes,
                stride: geometry.scan_stride_bytes(),
            });
        }

        for channel in layout.channels() {
            let (start, end) = channel.byte_span();
            if end > scan_bytes {
                return Err(LayoutError::FieldOutOfBounds {
                    channel: channel.name.clone(),
                    start,
                    end,
                    available: scan_bytes,
                }
                .into());
            }
            if !channel.signed && self.scaling.contains_key(&channel.name) {
                warn!("Ignoring scaling for unsigned channel {}", channel.name);
            }
        }

        let counter_index = match &self.sample_counter {
            Some(name) => {
                layout.channel(name)?;
                layout.channels().iter().position(|c| &c.name == name)
            }
            None => None,
        };

        let start = ReadCursor::new(self.device.read_position()?);
        let cursor = RingBufferCursor::new(geometry, start)?;

        info!(
            "Reader armed: {} channels, {}-byte scans, ring of {} scans",
            layout.len(),
            scan_bytes,
            geometry.capacity_scans()
        );

        self.session = Some(Session {
            layout,
            geometry,
            cursor,
            counter_index,
        });
        self.state = ReaderState::Armed;
        Ok(())
    }

    /// Arm with the layout and geometry the device publishes
    pub fn arm_from_device(&mut self) -> Result<(), ReaderError> {
        let descriptor = self.device.scan_descriptor()?;
        let layout = ScanLayoutParser::parse_bytes(&descriptor)?;
        let geometry = self.device.geometry()?;
        self.arm(layout, geometry)
    }

    /// Decode up to `max_scans` buffered scans
    ///
    /// Returns [`ReaderError::InsufficientSamples`] when nothing beyond the
    /// ADC delay is buffered yet.
    pub fn drain(&mut self, max_scans: usize) -> Result<SampleBlock, ReaderError> {
        match self.state {
            ReaderState::Armed | ReaderState::Running => self.decode_available(max_scans),
            ReaderState::ErrorRecovery => Err(ReaderError::BufferOverrun),
            state => Err(ReaderError::InvalidState {
                operation: "drain",
                state,
            }),
        }
    }

    /// Clear a pending overrun with the device and resume reading
    pub fn acknowledge_overrun(&mut self) -> Result<(), ReaderError> {
        if self.state != ReaderState::ErrorRecovery {
            return Err(ReaderError::InvalidState {
                operation: "acknowledge overrun",
                state: self.state,
            });
        }

        self.device.acknowledge_overrun()?;
        let position = self.device.read_position()?;
        if let Some(session) = self.session.as_mut() {
            session.cursor = RingBufferCursor::new(session.geometry, ReadCursor::new(position))?;
        }
        self.outstanding = 0;
        self.last_known_sample_index = None;
        self.state = ReaderState::Running;

        info!("Overrun acknowledged, resuming at position {}", position);
        Ok(())
    }

    /// Stop reading, optionally decoding what is still buffered
    pub fn stop(&mut self, final_drain: bool) -> Result<Option<SampleBlock>, ReaderError> {
        let block = match self.state {
            ReaderState::Armed | ReaderState::Running => {
                self.state = ReaderState::Draining;
                if final_drain {
                    match self.decode_available(usize::MAX) {
                        Ok(block) => Some(block),
                        Err(e) if e.is_transient() => None,
                        Err(e) => {
                            self.state = ReaderState::Stopped;
                            return Err(e);
                        }
                    }
                } else {
                    None
                }
            }
            ReaderState::Idle | ReaderState::ErrorRecovery => None,
            state => {
                return Err(ReaderError::InvalidState {
                    operation: "stop",
                    state,
                })
            }
        };

        self.state = ReaderState::Stopped;
        info!(
            "Reader stopped, final block of {} scans",
            block.as_ref().map_or(0, |b| b.scans)
        );
        Ok(block)
    }

    /// Free a block's scans with the device
    ///
    /// Only needed when `auto_release` is off.
    pub fn release(&mut self, block: &SampleBlock) -> Result<(), ReaderError> {
        if self.auto_release || block.consumed == 0 {
            return Ok(());
        }
        if block.consumed > self.outstanding {
            return Err(DeviceError::InvalidRequest(format!(
                "release of {} scans, {} outstanding",
                block.consumed, self.outstanding
            ))
            .into());
        }
        self.device.free_samples(block.consumed)?;
        self.outstanding -= block.consumed;
        Ok(())
    }

    /// Current state
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Armed layout
    pub fn layout(&self) -> Option<&ScanLayout> {
        self.session.as_ref().map(|s| &s.layout)
    }

    /// Next scan position to decode
    pub fn position(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.cursor.position())
    }

    /// Whether `drain` frees scans itself
    pub fn auto_release(&self) -> bool {
        self.auto_release
    }

    /// Scans decoded but not yet released
    pub fn outstanding_samples(&self) -> u64 {
        self.outstanding
    }

    /// Underlying device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Underlying device, mutably
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn decode_available(&mut self, max_scans: usize) -> Result<SampleBlock, ReaderError> {
        let available = match self.device.available_samples() {
            Ok(n) => n - self.outstanding as i64,
            Err(DeviceError::Overrun) => {
                self.enter_recovery();
                return Err(ReaderError::BufferOverrun);
            }
            Err(e) => return Err(e.into()),
        };
        let delay = self.device.adc_delay()?;

        let (scans, first_position, counter_span, channels) = {
            let session = self.session.as_ref().ok_or(ReaderError::InvalidState {
                operation: "drain",
                state: self.state,
            })?;

            let window =
                AdcDelayCompensator::effective(available, delay, session.cursor.cursor(), &session.geometry)?;
            let scans = window.count.min(max_scans.min(u32::MAX as usize) as i64) as u32;
            let delayed = RingBufferCursor::new(session.geometry, window.cursor)?;

            let decoder = ScanDecoder {
                layout: &session.layout,
                scaling: &self.scaling,
                coupling: self.delay_coupling,
                view: RingView::new(session.geometry, self.device.ring())?,
            };
            let columns = decoder.raw_columns(&session.cursor, &delayed, scans)?;
            let counter_span = session
                .counter_index
                .and_then(|i| columns[i].first().zip(columns[i].last()))
                .map(|(&first, &last)| (first as u32, last as u32));

            (
                scans,
                session.cursor.position(),
                counter_span,
                decoder.finish(columns, self.decode_mode),
            )
        };

        let consumed = scans as u64;
        // Free first so a failed release leaves the same scans to decode again
        if self.auto_release && consumed > 0 {
            self.device.free_samples(consumed)?;
        } else {
            self.outstanding += consumed;
        }

        if let Some(session) = self.session.as_mut() {
            session.cursor.advance(scans)?;
        }
        let lost_samples = self.track_counter(counter_span);
        let lost_duration =
            lost_samples.map(|n| Duration::from_secs_f64(n as f64 / self.sample_rate_hz));

        if self.state == ReaderState::Armed && scans > 0 {
            info!("Reader running");
            self.state = ReaderState::Running;
        }
        debug!(
            "Decoded {} scans from position {} (ADC delay {})",
            scans, first_position, delay
        );

        Ok(SampleBlock {
            scans: scans as usize,
            consumed,
            first_position,
            lost_samples,
            lost_duration,
            channels,
        })
    }

    fn enter_recovery(&mut self) {
        warn!("Device overrun, decoding suspended until acknowledged");
        if self.counter_before_overrun.is_none() {
            self.counter_before_overrun = self.last_known_sample_index.take();
        }
        self.state = ReaderState::ErrorRecovery;
    }

    /// Update counter bookkeeping and estimate losses after an overrun
    fn track_counter(&mut self, span: Option<(u32, u32)>) -> Option<u64> {
        let (first, last) = span?;
        let lost = match self.counter_before_overrun.take() {
            Some(before) => {
                // Approximate: assumes the counter advances once per scan
                let lost = first.wrapping_sub(before).wrapping_sub(1) as u64;
                info!("About {} scans lost to the overrun", lost);
                Some(lost)
            }
            None => {
                if let Some(prev) = self.last_known_sample_index {
                    if first != prev.wrapping_add(1) {
                        warn!("Sample counter jumped from {} to {}", prev, first);
                    }
                }
                None
            }
        };
        self.last_known_sample_index = Some(last);
        lost
    }
}
