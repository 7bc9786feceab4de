//! Scan Ring Buffer
//!
//! Cursor arithmetic over a fixed-size circular region that the acquisition
//! device fills with fixed-stride scans. The region itself is owned by the
//! device; this crate only tracks where to read next and hands out
//! bounds-checked views of whole scans.

mod cursor;
mod delay;
mod error;
mod geometry;
mod view;

pub use cursor::{ReadCursor, RingBufferCursor, ScanPositions};
pub use delay::{AdcDelayCompensator, EffectiveWindow};
pub use error::BufferError;
pub use geometry::RingBufferGeometry;
pub use view::RingView;
