//! Scan Descriptor Parser
//!
//! Reads the XML scan descriptor published by the driver:
//!
//! ```xml
//! <ScanDescriptor>
//!   <BoardId1>
//!     <ScanDescription version="2" scan_size="64" byte_order="little_endian">
//!       <Channel name="AI0" type="AI" index="0">
//!         <Sample offset="0" size="24"/>
//!       </Channel>
//!       <Channel name="CNT0" type="CNT" index="0">
//!         <Sample offset="32" size="32"/>
//!       </Channel>
//!     </ScanDescription>
//!   </BoardId1>
//! </ScanDescriptor>
//! ```
//!
//! The intermediate container element is named after the board and is matched
//! by position only. `byte_order`, `buffer` and similar attributes are ignored.

use crate::channel::{ChannelDescriptor, ChannelKind};
use crate::error::LayoutError;
use crate::layout::{ScanLayout, SUPPORTED_VERSION};
use roxmltree::{Document, Node};
use tracing::{debug, warn};

const ROOT_TAG: &str = "ScanDescriptor";
const DESCRIPTION_TAG: &str = "ScanDescription";
const CHANNEL_TAG: &str = "Channel";
const SAMPLE_TAG: &str = "Sample";

/// Builds a [`ScanLayout`] from a scan descriptor document
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanLayoutParser;

impl ScanLayoutParser {
    /// Parse descriptor text
    pub fn parse(descriptor_text: &str) -> Result<ScanLayout, LayoutError> {
        let doc = Document::parse(descriptor_text)?;

        let root = doc.root_element();
        if root.tag_name().name() != ROOT_TAG {
            return Err(LayoutError::ParseError(format!(
                "unexpected root element <{}>",
                root.tag_name().name()
            )));
        }

        let description = root
            .children()
            .filter(Node::is_element)
            .flat_map(|container| container.children())
            .find(|n| n.has_tag_name(DESCRIPTION_TAG))
            .ok_or_else(|| LayoutError::ParseError("ScanDescription not found".to_string()))?;

        let version_attr = description.attribute("version").unwrap_or("");
        match version_attr.trim().parse::<u32>() {
            Ok(SUPPORTED_VERSION) => {}
            _ => return Err(LayoutError::UnsupportedVersion(version_attr.to_string())),
        }

        let scan_size_bits = required_u32(description, "scan_size")?;

        let mut channels = Vec::new();
        for channel in description.children().filter(|n| n.has_tag_name(CHANNEL_TAG)) {
            if let Some(descriptor) = parse_channel(channel)? {
                channels.push(descriptor);
            }
        }

        debug!(
            "Parsed scan descriptor: {} channels, {} bits per scan",
            channels.len(),
            scan_size_bits
        );

        ScanLayout::new(SUPPORTED_VERSION, scan_size_bits, channels)
    }

    /// Parse the owned descriptor buffer returned by the device
    ///
    /// The buffer may carry a trailing NUL terminator.
    pub fn parse_bytes(descriptor: &[u8]) -> Result<ScanLayout, LayoutError> {
        let end = descriptor
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(descriptor.len());
        let text = std::str::from_utf8(&descriptor[..end])
            .map_err(|e| LayoutError::ParseError(format!("descriptor is not UTF-8: {}", e)))?;
        Self::parse(text)
    }
}

/// Parse one `Channel` element; `None` when it has no `Sample` node
fn parse_channel(channel: Node<'_, '_>) -> Result<Option<ChannelDescriptor>, LayoutError> {
    let name = channel.attribute("name").unwrap_or_default().to_string();

    let Some(sample) = channel.children().find(|n| n.has_tag_name(SAMPLE_TAG)) else {
        warn!("Skipping channel {:?} without a Sample node", name);
        return Ok(None);
    };

    let semantic_kind = ChannelKind::from_type_attr(channel.attribute("type").unwrap_or_default());
    let index = required_u32(channel, "index")?;
    let bit_offset = required_u32(sample, "offset")?;

    let size = required_u32(sample, "size")?;
    let bit_width = match u8::try_from(size) {
        Ok(w @ 1..=32) => w,
        _ => {
            return Err(LayoutError::ParseError(format!(
                "channel {:?} has unsupported sample size {}",
                name, size
            )))
        }
    };

    let signed = match sample.attribute("signed") {
        Some(text) => text.trim().parse::<bool>().map_err(|_| {
            LayoutError::ParseError(format!("channel {:?} has invalid signed flag {:?}", name, text))
        })?,
        None => semantic_kind.default_signed(),
    };

    Ok(Some(ChannelDescriptor {
        name,
        semantic_kind,
        index,
        bit_offset,
        bit_width,
        signed,
    }))
}

/// Read a mandatory unsigned attribute
fn required_u32(node: Node<'_, '_>, attr: &str) -> Result<u32, LayoutError> {
    let text = node.attribute(attr).ok_or_else(|| {
        LayoutError::ParseError(format!(
            "<{}> is missing attribute {:?}",
            node.tag_name().name(),
            attr
        ))
    })?;
    text.trim().parse::<u32>().map_err(|_| {
        LayoutError::ParseError(format!(
            "<{}> attribute {:?} is not an unsigned integer: {:?}",
            node.tag_name().name(),
            attr,
            text
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(version: &str, channels: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<ScanDescriptor>
  <BoardId1>
    <ScanDescription version="{}" scan_size="64" byte_order="little_endian">
      {}
    </ScanDescription>
  </BoardId1>
</ScanDescriptor>"#,
            version, channels
        )
    }

    const TWO_CHANNELS: &str = r#"
      <Channel name="AI0" type="AI" index="0"><Sample offset="0" size="24"/></Channel>
      <Channel name="CNT0" type="CNT" index="3"><Sample offset="32" size="32"/></Channel>"#;

    #[test]
    fn test_parse_two_channels() {
        let layout = ScanLayoutParser::parse(&descriptor("2", TWO_CHANNELS)).unwrap();

        assert_eq!(layout.version(), 2);
        assert_eq!(layout.scan_size_bits(), 64);
        assert_eq!(layout.channels().len(), 2);

        let ai = &layout.channels()[0];
        assert_eq!(ai.name, "AI0");
        assert_eq!(ai.semantic_kind, ChannelKind::Analog);
        assert_eq!(ai.index, 0);
        assert_eq!(ai.bit_offset, 0);
        assert_eq!(ai.bit_width, 24);
        assert!(ai.signed);

        let cnt = &layout.channels()[1];
        assert_eq!(cnt.name, "CNT0");
        assert_eq!(cnt.semantic_kind, ChannelKind::Counter);
        assert_eq!(cnt.index, 3);
        assert_eq!(cnt.bit_offset, 32);
        assert_eq!(cnt.bit_width, 32);
        assert!(!cnt.signed);
    }

    #[test]
    fn test_version_1_rejected() {
        assert!(matches!(
            ScanLayoutParser::parse(&descriptor("1", TWO_CHANNELS)),
            Err(LayoutError::UnsupportedVersion(v)) if v == "1"
        ));
    }

    #[test]
    fn test_missing_version_rejected() {
        let xml = r#"<ScanDescriptor><B><ScanDescription scan_size="8"/></B></ScanDescriptor>"#;
        assert!(matches!(
            ScanLayoutParser::parse(xml),
            Err(LayoutError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_malformed_xml_fails_cleanly() {
        assert!(matches!(
            ScanLayoutParser::parse("<ScanDescriptor><Board>"),
            Err(LayoutError::Xml(_))
        ));
        assert!(ScanLayoutParser::parse("").is_err());
    }

    #[test]
    fn test_missing_description() {
        let xml = r#"<ScanDescriptor><Board/></ScanDescriptor>"#;
        assert!(matches!(
            ScanLayoutParser::parse(xml),
            Err(LayoutError::ParseError(_))
        ));
    }

    #[test]
    fn test_wrong_root() {
        let xml = r#"<Other><B><ScanDescription version="2" scan_size="8"/></B></Other>"#;
        assert!(matches!(
            ScanLayoutParser::parse(xml),
            Err(LayoutError::ParseError(_))
        ));
    }

    #[test]
    fn test_bad_attribute() {
        let channels = r#"<Channel name="AI0" type="AI" index="x"><Sample offset="0" size="24"/></Channel>"#;
        assert!(matches!(
            ScanLayoutParser::parse(&descriptor("2", channels)),
            Err(LayoutError::ParseError(_))
        ));
    }

    #[test]
    fn test_oversized_sample_rejected() {
        let channels = r#"<Channel name="AI0" type="AI" index="0"><Sample offset="0" size="64"/></Channel>"#;
        assert!(ScanLayoutParser::parse(&descriptor("2", channels)).is_err());
    }

    #[test]
    fn test_channel_without_sample_skipped() {
        let channels = r#"
          <Channel name="AI0" type="AI" index="0"/>
          <Channel name="DI0" type="DI" index="0"><Sample offset="32" size="1"/></Channel>"#;
        let layout = ScanLayoutParser::parse(&descriptor("2", channels)).unwrap();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.channels()[0].semantic_kind, ChannelKind::Digital);
    }

    #[test]
    fn test_signed_override() {
        let channels = r#"<Channel name="CNT0" type="CNT" index="0"><Sample offset="0" size="32" signed="true"/></Channel>"#;
        let layout = ScanLayoutParser::parse(&descriptor("2", channels)).unwrap();
        assert!(layout.channels()[0].signed);
    }

    #[test]
    fn test_parse_bytes_with_terminator() {
        let mut bytes = descriptor("2", TWO_CHANNELS).into_bytes();
        bytes.push(0);
        bytes.extend_from_slice(b"garbage");
        let layout = ScanLayoutParser::parse_bytes(&bytes).unwrap();
        assert_eq!(layout.len(), 2);
    }

    #[test]
    fn test_parse_bytes_invalid_utf8() {
        assert!(matches!(
            ScanLayoutParser::parse_bytes(&[0xFF, 0xFE]),
            Err(LayoutError::ParseError(_))
        ));
    }
}
