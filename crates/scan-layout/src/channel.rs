//! Channel Descriptors and Field Extraction

use crate::error::LayoutError;
use serde::{Deserialize, Serialize};

/// Semantic family of a channel within a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Analog input (lags the scan by the ADC delay)
    Analog,
    /// Counter or board counter
    Counter,
    /// Discrete digital input
    Digital,
    /// Anything the descriptor does not classify
    Other,
}

/// `code` alone or followed by a channel number, e.g. `DI` or `DI3`
fn is_short_code(t: &str, code: &str) -> bool {
    t.strip_prefix(code)
        .map_or(false, |rest| rest.chars().next().map_or(true, |c| c.is_ascii_digit()))
}

impl ChannelKind {
    /// Classify the descriptor's `type` attribute
    pub fn from_type_attr(type_attr: &str) -> Self {
        let t = type_attr.trim().to_ascii_lowercase();
        if t.starts_with("ai") || t.starts_with("analog") {
            ChannelKind::Analog
        } else if t.starts_with("cnt") || t.starts_with("boardcnt") || t.starts_with("counter") {
            ChannelKind::Counter
        } else if is_short_code(&t, "di") || t.starts_with("discret") || t.starts_with("digital") {
            ChannelKind::Digital
        } else {
            ChannelKind::Other
        }
    }

    /// Whether samples of this kind are two's complement by default
    pub fn default_signed(&self) -> bool {
        matches!(self, ChannelKind::Analog)
    }
}

/// Position and width of one channel inside a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    /// Channel name (e.g. "AI0")
    pub name: String,
    /// Channel family
    pub semantic_kind: ChannelKind,
    /// Ordinal within its kind
    pub index: u32,
    /// Offset from scan start in bits
    pub bit_offset: u32,
    /// Field width in bits (1-32)
    pub bit_width: u8,
    /// Whether the field is two's complement
    pub signed: bool,
}

impl ChannelDescriptor {
    /// Mask covering the field's bits
    pub fn bit_mask(&self) -> u32 {
        if self.bit_width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.bit_width) - 1
        }
    }

    /// Byte range of the scan this field touches
    pub fn byte_span(&self) -> (usize, usize) {
        let start = (self.bit_offset / 8) as usize;
        let shift = self.bit_offset % 8;
        let len = (shift + self.bit_width as u32).div_ceil(8) as usize;
        (start, start + len)
    }

    /// Read the field's bits from one scan, unsigned
    pub fn extract(&self, scan: &[u8]) -> Result<u32, LayoutError> {
        let (start, end) = self.byte_span();
        let bytes = scan.get(start..end).ok_or_else(|| LayoutError::FieldOutOfBounds {
            channel: self.name.clone(),
            start,
            end,
            available: scan.len(),
        })?;

        // At most five bytes for a 32-bit field at a non-byte boundary
        let word = bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64);
        let shift = self.bit_offset % 8;
        Ok(((word >> shift) as u32) & self.bit_mask())
    }

    /// Read the field and sign-extend it to 32 bits when the channel is signed
    pub fn extract_signed(&self, scan: &[u8]) -> Result<i32, LayoutError> {
        let value = self.extract(scan)?;
        if !self.signed || self.bit_width >= 32 {
            return Ok(value as i32);
        }
        let unused = 32 - self.bit_width as u32;
        Ok(((value << unused) as i32) >> unused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn channel(bit_offset: u32, bit_width: u8, signed: bool) -> ChannelDescriptor {
        ChannelDescriptor {
            name: "AI0".to_string(),
            semantic_kind: ChannelKind::Analog,
            index: 0,
            bit_offset,
            bit_width,
            signed,
        }
    }

    #[test]
    fn test_kind_from_type() {
        assert_eq!(ChannelKind::from_type_attr("AI"), ChannelKind::Analog);
        assert_eq!(ChannelKind::from_type_attr("analog"), ChannelKind::Analog);
        assert_eq!(ChannelKind::from_type_attr("CNT"), ChannelKind::Counter);
        assert_eq!(ChannelKind::from_type_attr("BoardCNT"), ChannelKind::Counter);
        assert_eq!(ChannelKind::from_type_attr("DI"), ChannelKind::Digital);
        assert_eq!(ChannelKind::from_type_attr("digital"), ChannelKind::Digital);
        assert_eq!(ChannelKind::from_type_attr("CAN"), ChannelKind::Other);
    }

    #[test]
    fn test_digital_code_needs_number_or_end() {
        assert_eq!(ChannelKind::from_type_attr("DI0"), ChannelKind::Digital);
        assert_eq!(ChannelKind::from_type_attr(" di12 "), ChannelKind::Digital);
        assert_eq!(ChannelKind::from_type_attr("Discret"), ChannelKind::Digital);
        assert_eq!(ChannelKind::from_type_attr("diag"), ChannelKind::Other);
        assert_eq!(ChannelKind::from_type_attr("Disabled"), ChannelKind::Other);
        assert_eq!(ChannelKind::from_type_attr("DIO"), ChannelKind::Other);
    }

    #[test]
    fn test_extract_32bit_little_endian() {
        let scan = [0x00, 0x00, 0x00, 0x00, 0x78, 0x56, 0x34, 0x12];
        assert_eq!(channel(32, 32, false).extract(&scan).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_extract_24bit_signed() {
        let scan = [0xFF, 0xFF, 0xFF, 0x00];
        let ch = channel(0, 24, true);
        assert_eq!(ch.extract(&scan).unwrap(), 0x00FF_FFFF);
        assert_eq!(ch.extract_signed(&scan).unwrap(), -1);
    }

    #[test]
    fn test_extract_16bit_signed() {
        let scan = [0x00, 0x80];
        assert_eq!(channel(0, 16, true).extract_signed(&scan).unwrap(), -32768);
        assert_eq!(channel(0, 16, false).extract_signed(&scan).unwrap(), 32768);
    }

    #[test]
    fn test_extract_single_bit() {
        // Bit 11 set
        let scan = [0x00, 0x08];
        assert_eq!(channel(11, 1, false).extract(&scan).unwrap(), 1);
        assert_eq!(channel(10, 1, false).extract(&scan).unwrap(), 0);
    }

    #[test]
    fn test_extract_unaligned_32bit() {
        let scan = [0xF0, 0xFF, 0xFF, 0xFF, 0x0F];
        assert_eq!(channel(4, 32, false).extract(&scan).unwrap(), u32::MAX);
    }

    #[test]
    fn test_extract_out_of_bounds() {
        let scan = [0u8; 4];
        assert!(matches!(
            channel(16, 32, false).extract(&scan),
            Err(LayoutError::FieldOutOfBounds { start: 2, end: 6, .. })
        ));
    }

    #[test]
    fn test_bit_mask() {
        assert_eq!(channel(0, 1, false).bit_mask(), 0x1);
        assert_eq!(channel(0, 24, false).bit_mask(), 0x00FF_FFFF);
        assert_eq!(channel(0, 32, false).bit_mask(), u32::MAX);
    }

    proptest! {
        #[test]
        fn prop_extract_ignores_neighbouring_bits(
            value in any::<u32>(),
            bit_offset in 0u32..32,
            bit_width in 1u8..=32,
        ) {
            let field = channel(bit_offset, bit_width, false);
            let word = ((value & field.bit_mask()) as u128) << bit_offset;
            // Surrounding bits set to one must not leak into the field
            let noise = !((field.bit_mask() as u128) << bit_offset);
            let scan = (word | noise).to_le_bytes();
            prop_assert_eq!(field.extract(&scan).unwrap(), value & field.bit_mask());
        }
    }
}
