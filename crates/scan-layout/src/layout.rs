//! Scan Layout

use crate::channel::{ChannelDescriptor, ChannelKind};
use crate::error::LayoutError;
use serde::{Deserialize, Serialize};

/// The only scan descriptor version this decoder understands
pub const SUPPORTED_VERSION: u32 = 2;

/// Channel composition of one scan, in descriptor order
///
/// Built once per acquisition configuration and never mutated; rebuild it when
/// the configuration changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanLayout {
    channels: Vec<ChannelDescriptor>,
    scan_size_bits: u32,
    version: u32,
}

impl ScanLayout {
    /// Create a layout, rejecting unsupported versions
    pub fn new(
        version: u32,
        scan_size_bits: u32,
        channels: Vec<ChannelDescriptor>,
    ) -> Result<Self, LayoutError> {
        if version != SUPPORTED_VERSION {
            return Err(LayoutError::UnsupportedVersion(version.to_string()));
        }
        Ok(Self {
            channels,
            scan_size_bits,
            version,
        })
    }

    /// Channels in descriptor order
    pub fn channels(&self) -> &[ChannelDescriptor] {
        &self.channels
    }

    /// Scan size in bits
    pub fn scan_size_bits(&self) -> u32 {
        self.scan_size_bits
    }

    /// Scan size in whole bytes
    pub fn scan_size_bytes(&self) -> usize {
        self.scan_size_bits.div_ceil(8) as usize
    }

    /// Descriptor version
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Look up a channel by name
    pub fn channel(&self, name: &str) -> Result<&ChannelDescriptor, LayoutError> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| LayoutError::UnknownChannel(name.to_string()))
    }

    /// Channels of one kind, in descriptor order
    pub fn channels_of_kind(&self, kind: ChannelKind) -> impl Iterator<Item = &ChannelDescriptor> {
        self.channels.iter().filter(move |c| c.semantic_kind == kind)
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the layout has no channels
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, kind: ChannelKind, bit_offset: u32) -> ChannelDescriptor {
        ChannelDescriptor {
            name: name.to_string(),
            semantic_kind: kind,
            index: 0,
            bit_offset,
            bit_width: 32,
            signed: kind.default_signed(),
        }
    }

    #[test]
    fn test_rejects_other_versions() {
        assert!(matches!(
            ScanLayout::new(3, 64, Vec::new()),
            Err(LayoutError::UnsupportedVersion(v)) if v == "3"
        ));
    }

    #[test]
    fn test_lookup_and_filter() {
        let layout = ScanLayout::new(
            2,
            64,
            vec![
                descriptor("AI0", ChannelKind::Analog, 0),
                descriptor("CNT0", ChannelKind::Counter, 32),
            ],
        )
        .unwrap();

        assert_eq!(layout.scan_size_bytes(), 8);
        assert_eq!(layout.channel("CNT0").unwrap().bit_offset, 32);
        assert!(layout.channel("AI9").is_err());
        assert_eq!(layout.channels_of_kind(ChannelKind::Analog).count(), 1);
    }
}
