//! Range Property Parsing
//!
//! The driver reports a channel's input range as text, either `"min..max"` for an
//! asymmetric range or a single magnitude such as `"10 V"` for `-10..10`.

use crate::error::ScaleError;
use crate::transform::ScaleTransform;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Configured input range of a channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSpan {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl RangeSpan {
    /// Create a range from explicit bounds
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Create a symmetric range `-magnitude..magnitude`
    pub fn symmetric(magnitude: f64) -> Self {
        Self {
            min: -magnitude,
            max: magnitude,
        }
    }

    /// Parse a range property such as `"-5..10 V"` or `"10 V"`
    pub fn parse(text: &str) -> Result<Self, ScaleError> {
        let invalid = || ScaleError::InvalidRangeText(text.to_string());
        let trimmed = text.trim();

        let span = match trimmed.split_once("..") {
            Some((low, high)) if !high.trim().is_empty() => {
                let min = leading_number(low).ok_or_else(invalid)?;
                let max = leading_number(high).ok_or_else(invalid)?;
                Self::new(min, max)
            }
            // "10.." carries no upper bound and reads as symmetric
            Some((low, _)) => Self::symmetric(leading_number(low).ok_or_else(invalid)?),
            None => Self::symmetric(leading_number(trimmed).ok_or_else(invalid)?),
        };

        debug!("Parsed range {:?} as {}..{}", text, span.min, span.max);
        Ok(span)
    }

    /// Width of the range
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Derive the scale transform for this range at the given sample width
    pub fn transform(&self, bit_width: u8) -> Result<ScaleTransform, ScaleError> {
        ScaleTransform::derive(self.min, self.max, bit_width)
    }
}

impl FromStr for RangeSpan {
    type Err = ScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Longest numeric prefix of `text`, ignoring trailing unit text
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].trim_end().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}
