//! Scan Decoding
//!
//! Turns a window of ring scans into per-channel arrays. Each channel's field is
//! cut out of its scan by the layout, sign-extended according to the ADC data
//! width, and optionally converted to physical units.

use crate::error::ReaderError;
use ring_buffer::{RingBufferCursor, RingView};
use scan_layout::{ChannelDescriptor, ChannelKind, ScanLayout};
use scan_scaling::{max_raw_for, ScaleTransform, SignExtender};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Output representation of scaled channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Apply each channel's transform
    #[default]
    Physical,
    /// Keep normalized raw codes
    Raw,
}

/// Which channels read from the ADC-delayed cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayCoupling {
    /// Only analog channels are shifted; counters and digital lines use the base cursor
    #[default]
    AnalogOnly,
    /// Every channel is shifted
    AllChannels,
}

impl DelayCoupling {
    /// Whether channels of this kind read at the delayed position
    pub fn is_delayed(&self, kind: ChannelKind) -> bool {
        match self {
            DelayCoupling::AnalogOnly => kind == ChannelKind::Analog,
            DelayCoupling::AllChannels => true,
        }
    }
}

/// How one signed channel's container is normalized and scaled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelScaling {
    /// Conversion to physical units; `None` keeps raw codes even in physical mode
    pub transform: Option<ScaleTransform>,
    /// ADC data width (16, 24 or 32)
    pub data_width: u8,
    /// Left shift of a 24-bit value inside its container
    pub embedded_bit_offset: u8,
}

impl ChannelScaling {
    /// Scaling for a transform, taking the data width from it
    pub fn new(transform: ScaleTransform) -> Self {
        Self {
            transform: Some(transform),
            data_width: transform.bit_width(),
            embedded_bit_offset: 0,
        }
    }

    /// Sign normalization only
    pub fn normalize_only(data_width: u8, embedded_bit_offset: u8) -> Result<Self, ReaderError> {
        max_raw_for(data_width)?;
        Ok(Self {
            transform: None,
            data_width,
            embedded_bit_offset,
        })
    }

    /// Set the embedded bit offset
    pub fn with_embedded_offset(mut self, embedded_bit_offset: u8) -> Self {
        self.embedded_bit_offset = embedded_bit_offset;
        self
    }

    /// Normalize a container value to a canonical signed code
    #[inline]
    pub fn normalize(&self, raw: i32) -> Result<i32, ReaderError> {
        Ok(SignExtender::normalize(raw, self.data_width, self.embedded_bit_offset)?)
    }
}

/// Decoded values of one channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    /// Normalized codes; unsigned fields are zero-extended
    Raw(Vec<i64>),
    /// Physical units
    Physical(Vec<f64>),
}

impl ChannelValues {
    /// Number of values
    pub fn len(&self) -> usize {
        match self {
            ChannelValues::Raw(v) => v.len(),
            ChannelValues::Physical(v) => v.len(),
        }
    }

    /// Whether no values were decoded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw codes, if this channel was left unscaled
    pub fn as_raw(&self) -> Option<&[i64]> {
        match self {
            ChannelValues::Raw(v) => Some(v),
            ChannelValues::Physical(_) => None,
        }
    }

    /// Physical values, if this channel was scaled
    pub fn as_physical(&self) -> Option<&[f64]> {
        match self {
            ChannelValues::Physical(v) => Some(v),
            ChannelValues::Raw(_) => None,
        }
    }
}

/// One channel's column of a block
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSamples {
    /// Channel name from the descriptor
    pub name: String,
    /// Channel family
    pub kind: ChannelKind,
    /// One value per decoded scan
    pub values: ChannelValues,
}

/// Result of one drain
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleBlock {
    /// Scans decoded
    pub scans: usize,
    /// Scans to hand back to the device
    pub consumed: u64,
    /// Ring position of the first decoded scan
    pub first_position: u64,
    /// Approximate scans lost to the preceding overrun
    pub lost_samples: Option<u64>,
    /// Acquisition time covered by `lost_samples` at the configured rate
    pub lost_duration: Option<Duration>,
    /// Columns in layout order
    pub channels: Vec<ChannelSamples>,
}

impl SampleBlock {
    /// Look up a channel's column by name
    pub fn channel(&self, name: &str) -> Option<&ChannelSamples> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Whether the block holds no scans
    pub fn is_empty(&self) -> bool {
        self.scans == 0
    }
}

/// Read one channel's value from its scan
#[inline]
fn read_field(
    channel: &ChannelDescriptor,
    scaling: Option<&ChannelScaling>,
    scan: &[u8],
) -> Result<i64, ReaderError> {
    if !channel.signed {
        return Ok(channel.extract(scan)? as i64);
    }
    let value = channel.extract_signed(scan)?;
    match scaling {
        Some(s) => Ok(s.normalize(value)? as i64),
        None => Ok(value as i64),
    }
}

/// Borrowed inputs for decoding one window
pub(crate) struct ScanDecoder<'a> {
    pub layout: &'a ScanLayout,
    pub scaling: &'a HashMap<String, ChannelScaling>,
    pub coupling: DelayCoupling,
    pub view: RingView<'a>,
}

impl ScanDecoder<'_> {
    /// Extract `count` scans; `base` feeds undelayed channels, `delayed` the rest
    pub fn raw_columns(
        &self,
        base: &RingBufferCursor,
        delayed: &RingBufferCursor,
        count: u32,
    ) -> Result<Vec<Vec<i64>>, ReaderError> {
        let channels = self.layout.channels();
        let mut columns: Vec<Vec<i64>> = channels
            .iter()
            .map(|_| Vec::with_capacity(count as usize))
            .collect();

        for (base_pos, delayed_pos) in base.scan_positions(count).zip(delayed.scan_positions(count)) {
            let base_scan = self.view.scan_at(base_pos)?;
            let delayed_scan = self.view.scan_at(delayed_pos)?;

            for (channel, column) in channels.iter().zip(columns.iter_mut()) {
                let scan = if self.coupling.is_delayed(channel.semantic_kind) {
                    delayed_scan
                } else {
                    base_scan
                };
                column.push(read_field(channel, self.scaling.get(&channel.name), scan)?);
            }
        }

        Ok(columns)
    }

    /// Wrap raw columns as block channels, converting where a transform applies
    pub fn finish(&self, columns: Vec<Vec<i64>>, mode: DecodeMode) -> Vec<ChannelSamples> {
        self.layout
            .channels()
            .iter()
            .zip(columns)
            .map(|(channel, raw)| {
                let transform = self
                    .scaling
                    .get(&channel.name)
                    .and_then(|s| s.transform)
                    .filter(|_| channel.signed && mode == DecodeMode::Physical);
                let values = match transform {
                    Some(t) => ChannelValues::Physical(to_physical(&t, &raw)),
                    None => ChannelValues::Raw(raw),
                };
                ChannelSamples {
                    name: channel.name.clone(),
                    kind: channel.semantic_kind,
                    values,
                }
            })
            .collect()
    }
}

fn to_physical(transform: &ScaleTransform, raw: &[i64]) -> Vec<f64> {
    // Signed fields are at most 32 bits wide
    raw.iter().map(|&r| transform.apply(r as i32)).collect()
}
