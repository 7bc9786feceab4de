//! Sign Extension for Fixed-Width Samples

use crate::error::ScaleError;

/// Sign bit of a 24-bit sample
const SIGN_BIT_24: u32 = 0x0080_0000;
/// Bits above a 24-bit sample
const UPPER_BYTE: u32 = 0xFF00_0000;
/// Payload bits of a 24-bit sample
const LOWER_24: u32 = 0x00FF_FFFF;

/// Normalizes raw 16/24/32-bit samples to canonical signed 32-bit values
#[derive(Debug, Clone, Copy, Default)]
pub struct SignExtender;

impl SignExtender {
    /// Normalize a raw container value
    ///
    /// # Arguments
    /// * `raw` - 32-bit container as read from the scan
    /// * `bit_width` - ADC data width (16, 24 or 32)
    /// * `embedded_bit_offset` - left shift of a 24-bit value inside its container
    pub fn normalize(raw: i32, bit_width: u8, embedded_bit_offset: u8) -> Result<i32, ScaleError> {
        match bit_width {
            16 | 32 => Ok(raw),
            24 if embedded_bit_offset == 0 => {
                let bits = raw as u32;
                if bits & SIGN_BIT_24 != 0 {
                    Ok((bits | UPPER_BYTE) as i32)
                } else {
                    Ok((bits & LOWER_24) as i32)
                }
            }
            24 => {
                if embedded_bit_offset >= 32 {
                    return Err(ScaleError::InvalidBitOffset(embedded_bit_offset));
                }
                if raw < 0 {
                    // Shift the magnitude so the sign survives the truncation
                    Ok((raw.wrapping_neg() >> embedded_bit_offset).wrapping_neg())
                } else {
                    Ok(raw >> embedded_bit_offset)
                }
            }
            other => Err(ScaleError::UnsupportedWidth(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_24bit_all_ones_is_minus_one() {
        assert_eq!(SignExtender::normalize(0x00FF_FFFF, 24, 0).unwrap(), -1);
    }

    #[test]
    fn test_24bit_positive_masks_upper_byte() {
        // Garbage in the upper byte is dropped for positive values
        assert_eq!(SignExtender::normalize(0x7A12_3456, 24, 0).unwrap(), 0x0012_3456);
        assert_eq!(SignExtender::normalize(0x007F_FFFF, 24, 0).unwrap(), 8_388_607);
    }

    #[test]
    fn test_24bit_most_negative() {
        assert_eq!(SignExtender::normalize(0x0080_0000, 24, 0).unwrap(), -8_388_608);
    }

    #[test]
    fn test_24bit_embedded_offset() {
        // +1000 stored in the upper 24 bits of a 32-bit word
        assert_eq!(SignExtender::normalize(1000 << 8, 24, 8).unwrap(), 1000);
        // -1000 stored the same way
        assert_eq!(SignExtender::normalize(-1000 << 8, 24, 8).unwrap(), -1000);
    }

    #[test]
    fn test_24bit_embedded_negative_rounds_toward_zero() {
        // Low garbage bits are truncated toward zero, not toward minus infinity
        let raw = (-1000 << 8) - 0x7F;
        assert_eq!(SignExtender::normalize(raw, 24, 8).unwrap(), -1000);
    }

    #[test]
    fn test_embedded_offset_min_value_does_not_panic() {
        assert!(SignExtender::normalize(i32::MIN, 24, 8).is_ok());
    }

    #[test]
    fn test_invalid_offset() {
        assert_eq!(
            SignExtender::normalize(5, 24, 32),
            Err(ScaleError::InvalidBitOffset(32))
        );
    }

    #[test]
    fn test_unsupported_width() {
        assert_eq!(
            SignExtender::normalize(5, 12, 0),
            Err(ScaleError::UnsupportedWidth(12))
        );
    }

    proptest! {
        #[test]
        fn prop_16bit_is_identity(raw in any::<i32>(), offset in 0u8..32) {
            prop_assert_eq!(SignExtender::normalize(raw, 16, offset).unwrap(), raw);
        }

        #[test]
        fn prop_32bit_is_identity(raw in any::<i32>()) {
            prop_assert_eq!(SignExtender::normalize(raw, 32, 0).unwrap(), raw);
        }

        #[test]
        fn prop_24bit_stays_in_range(raw in any::<i32>()) {
            let value = SignExtender::normalize(raw, 24, 0).unwrap();
            prop_assert!((-8_388_608..=8_388_607).contains(&value));
            prop_assert_eq!(value as u32 & LOWER_24, raw as u32 & LOWER_24);
        }
    }
}
