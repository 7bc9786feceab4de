//! Scan Layout
//!
//! Parses the driver's versioned scan descriptor into an immutable [`ScanLayout`]
//! and extracts individual channel fields from packed little-endian scans.

mod channel;
mod error;
mod layout;
mod parser;

pub use channel::{ChannelDescriptor, ChannelKind};
pub use error::LayoutError;
pub use layout::{ScanLayout, SUPPORTED_VERSION};
pub use parser::ScanLayoutParser;
