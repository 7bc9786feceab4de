//! Linear Gain/Offset Scaling
//!
//! Maps a signed raw ADC code onto the configured input range:
//!
//! ```text
//! span = range_max - range_min
//! k    = span / 2
//! d    = k - range_max
//! gain = k / max_raw
//! physical = raw * gain - d
//! ```
//!
//! The positive and negative raw ranges differ by one code, so the most negative
//! code lands slightly below `range_min`. That approximation is inherited from the
//! driver's own scaling and is kept as-is.

use crate::error::ScaleError;
use serde::{Deserialize, Serialize};

/// Sample widths the ADC can deliver
pub const SUPPORTED_WIDTHS: [u8; 3] = [16, 24, 32];

/// Largest positive raw code for a signed sample of the given width
pub fn max_raw_for(bit_width: u8) -> Result<i32, ScaleError> {
    match bit_width {
        16 => Ok(i16::MAX as i32),
        24 => Ok((1 << 23) - 1),
        32 => Ok(i32::MAX),
        other => Err(ScaleError::UnsupportedWidth(other)),
    }
}

/// Most negative raw code for a signed sample of the given width
pub fn min_raw_for(bit_width: u8) -> Result<i32, ScaleError> {
    match bit_width {
        16 => Ok(i16::MIN as i32),
        24 => Ok(-(1 << 23)),
        32 => Ok(i32::MIN),
        other => Err(ScaleError::UnsupportedWidth(other)),
    }
}

/// Linear mapping from raw integer codes to physical units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleTransform {
    /// Physical units per raw code (k)
    gain: f64,
    /// Subtracted after multiplication (d)
    offset: f64,
    /// ADC sample width in bits
    bit_width: u8,
    /// Lower end of the configured range
    range_min: f64,
    /// Upper end of the configured range
    range_max: f64,
}

impl ScaleTransform {
    /// Derive the transform for a configured range and sample width
    pub fn derive(range_min: f64, range_max: f64, bit_width: u8) -> Result<Self, ScaleError> {
        if range_min.is_nan() || range_max.is_nan() || range_max <= range_min {
            return Err(ScaleError::InvalidRange {
                min: range_min,
                max: range_max,
            });
        }
        let max_raw = max_raw_for(bit_width)?;

        let span = range_max - range_min;
        let k = span / 2.0;
        let d = k - range_max;

        Ok(Self {
            gain: k / max_raw as f64,
            offset: d,
            bit_width,
            range_min,
            range_max,
        })
    }

    /// Build a transform from the gain and offset published by the driver
    ///
    /// The driver reports these as text, so they carry less precision than
    /// [`ScaleTransform::derive`]. The covered range is reconstructed from the
    /// extreme raw codes.
    pub fn from_driver(scale_value: f64, scale_offset: f64, bit_width: u8) -> Result<Self, ScaleError> {
        let max_raw = max_raw_for(bit_width)?;
        let min_raw = min_raw_for(bit_width)?;

        let range_max = max_raw as f64 * scale_value - scale_offset;
        let range_min = min_raw as f64 * scale_value - scale_offset;
        if scale_value.is_nan() || scale_value <= 0.0 || !range_max.is_finite() || !range_min.is_finite() {
            return Err(ScaleError::InvalidRange {
                min: range_min,
                max: range_max,
            });
        }

        Ok(Self {
            gain: scale_value,
            offset: scale_offset,
            bit_width,
            range_min,
            range_max,
        })
    }

    /// Convert a normalized raw code into physical units
    #[inline]
    pub fn apply(&self, raw: i32) -> f64 {
        raw as f64 * self.gain - self.offset
    }

    /// Convert a whole channel array
    pub fn apply_all(&self, raw: &[i32]) -> Vec<f64> {
        raw.iter().map(|&r| self.apply(r)).collect()
    }

    /// Get the gain (k)
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Get the offset (d)
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Get the sample width this transform was derived for
    pub fn bit_width(&self) -> u8 {
        self.bit_width
    }

    /// Get the configured lower range bound
    pub fn range_min(&self) -> f64 {
        self.range_min
    }

    /// Get the configured upper range bound
    pub fn range_max(&self) -> f64 {
        self.range_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asymmetric_24bit_range() {
        let scale = ScaleTransform::derive(-5.0, 10.0, 24).unwrap();

        assert_eq!(scale.gain(), 7.5 / 8_388_607.0);
        assert!(((scale.gain() - 8.9407279e-7) / 8.9407279e-7).abs() < 1e-5);
        assert!((scale.offset() - (-2.5)).abs() < 1e-12);
        assert!((scale.apply(8_388_607) - 10.0).abs() < 1e-9);

        // One code more on the negative side
        let low = scale.apply(-8_388_608);
        assert!((low - (-5.000001)).abs() < 1e-6);
        assert!(low < -5.0);
    }

    #[test]
    fn test_max_raw_hits_range_max() {
        for width in SUPPORTED_WIDTHS {
            let scale = ScaleTransform::derive(-10.0, 10.0, width).unwrap();
            let max_raw = max_raw_for(width).unwrap();
            assert!((scale.apply(max_raw) - 10.0).abs() < 1e-9, "width {}", width);
        }
    }

    #[test]
    fn test_zero_code_is_range_center() {
        let scale = ScaleTransform::derive(-5.0, 10.0, 16).unwrap();
        assert!((scale.apply(0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_range_rejected() {
        assert!(matches!(
            ScaleTransform::derive(5.0, 5.0, 24),
            Err(ScaleError::InvalidRange { .. })
        ));
        assert!(matches!(
            ScaleTransform::derive(10.0, -10.0, 24),
            Err(ScaleError::InvalidRange { .. })
        ));
        assert!(ScaleTransform::derive(f64::NAN, 1.0, 24).is_err());
    }

    #[test]
    fn test_unsupported_width_rejected() {
        assert_eq!(
            ScaleTransform::derive(-1.0, 1.0, 12),
            Err(ScaleError::UnsupportedWidth(12))
        );
    }

    #[test]
    fn test_from_driver_matches_derived() {
        let derived = ScaleTransform::derive(-5.0, 10.0, 24).unwrap();
        let driver = ScaleTransform::from_driver(derived.gain(), derived.offset(), 24).unwrap();

        assert!((driver.range_max() - 10.0).abs() < 1e-9);
        assert!((driver.apply(1234) - derived.apply(1234)).abs() < 1e-12);
    }

    #[test]
    fn test_from_driver_rejects_zero_gain() {
        assert!(ScaleTransform::from_driver(0.0, 0.0, 24).is_err());
    }

    #[test]
    fn test_apply_all() {
        let scale = ScaleTransform::derive(-10.0, 10.0, 16).unwrap();
        let values = scale.apply_all(&[0, 32767]);
        assert_eq!(values.len(), 2);
        assert!(values[0].abs() < 1e-12);
        assert!((values[1] - 10.0).abs() < 1e-9);
    }
}
