//! Raw Sample Scaling
//!
//! Normalizes fixed-width ADC samples to signed 32-bit values and converts them
//! into calibrated physical quantities using a linear gain/offset model.

mod error;
mod range;
mod sign;
mod transform;

pub use error::ScaleError;
pub use range::RangeSpan;
pub use sign::SignExtender;
pub use transform::{max_raw_for, min_raw_for, ScaleTransform, SUPPORTED_WIDTHS};
