//! Reader Configuration
//!
//! Settings are read from a TOML file and may be overridden with `ACQ_`-prefixed
//! environment variables (e.g. `ACQ_AUTO_RELEASE=false`).

use crate::decode::{ChannelScaling, DecodeMode, DelayCoupling};
use crate::error::ReaderError;
use config::{Config, Environment, File};
use scan_scaling::{RangeSpan, ScaleTransform};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Scaling settings for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelScalingConfig {
    /// Channel name from the scan descriptor
    pub name: String,
    /// Input range text such as `"-5..10 V"` or `"10 V"`
    #[serde(default)]
    pub range: Option<String>,
    /// Gain published by the driver; takes precedence over `range`
    #[serde(default)]
    pub scale_value: Option<f64>,
    /// Offset published by the driver
    #[serde(default)]
    pub scale_offset: Option<f64>,
    /// ADC data width in bits
    #[serde(default = "default_data_width")]
    pub data_width: u8,
    /// Left shift of a 24-bit value inside its container
    #[serde(default)]
    pub embedded_bit_offset: u8,
}

fn default_data_width() -> u8 {
    24
}

impl ChannelScalingConfig {
    /// Build the runtime scaling for this entry
    pub fn to_scaling(&self) -> Result<ChannelScaling, ReaderError> {
        let transform = match (self.scale_value, &self.range) {
            (Some(value), _) => Some(ScaleTransform::from_driver(
                value,
                self.scale_offset.unwrap_or(0.0),
                self.data_width,
            )?),
            (None, Some(text)) => Some(RangeSpan::parse(text)?.transform(self.data_width)?),
            (None, None) => None,
        };

        match transform {
            Some(t) => Ok(ChannelScaling::new(t).with_embedded_offset(self.embedded_bit_offset)),
            None => ChannelScaling::normalize_only(self.data_width, self.embedded_bit_offset),
        }
    }
}

/// Acquisition reader settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Channels that read at the ADC-delayed position
    pub delay_coupling: DelayCoupling,
    /// Physical or raw output
    pub decode_mode: DecodeMode,
    /// Free consumed scans inside `drain`
    pub auto_release: bool,
    /// Scans per poll
    pub block_size: u32,
    /// Device scan rate in Hz
    pub sample_rate_hz: f64,
    /// Counter channel used to estimate losses after an overrun
    pub sample_counter_channel: Option<String>,
    /// Per-channel scaling
    pub channels: Vec<ChannelScalingConfig>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            delay_coupling: DelayCoupling::AnalogOnly,
            decode_mode: DecodeMode::Physical,
            auto_release: true,
            block_size: 1000,
            sample_rate_hz: 10_000.0,
            sample_counter_channel: None,
            channels: Vec::new(),
        }
    }
}

impl ReaderConfig {
    /// Load settings from a file, then apply `ACQ_` environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("ACQ").try_parsing(true))
            .build()?;

        let config: ReaderConfig = settings.try_deserialize()?;
        config.validate()?;
        info!("Loaded reader configuration from {}", path.display());
        Ok(config)
    }

    /// Check values that deserialize but cannot be used
    pub fn validate(&self) -> Result<(), ReaderError> {
        if self.block_size == 0 {
            return Err(ReaderError::InvalidConfig("block_size must be positive".to_string()));
        }
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(ReaderError::InvalidConfig(format!(
                "sample_rate_hz must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        Ok(())
    }

    /// Time for the device to produce one block
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate_hz)
    }

    /// Runtime scaling for every configured channel
    pub fn channel_scaling(&self) -> Result<HashMap<String, ChannelScaling>, ReaderError> {
        self.channels
            .iter()
            .map(|c| Ok((c.name.clone(), c.to_scaling()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ReaderConfig::default();
        assert!(config.auto_release);
        assert_eq!(config.decode_mode, DecodeMode::Physical);
        assert_eq!(config.delay_coupling, DelayCoupling::AnalogOnly);
        assert_eq!(config.polling_interval(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_rate() {
        let config = ReaderConfig {
            sample_rate_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ReaderError::InvalidConfig(_))));
    }

    #[test]
    fn test_scaling_from_range() {
        let entry = ChannelScalingConfig {
            name: "AI0".to_string(),
            range: Some("-5..10 V".to_string()),
            scale_value: None,
            scale_offset: None,
            data_width: 24,
            embedded_bit_offset: 0,
        };
        let scaling = entry.to_scaling().unwrap();
        let transform = scaling.transform.unwrap();
        assert!((transform.offset() + 2.5).abs() < 1e-12);
        assert_eq!(scaling.data_width, 24);
    }

    #[test]
    fn test_scaling_without_transform() {
        let entry = ChannelScalingConfig {
            name: "AI1".to_string(),
            range: None,
            scale_value: None,
            scale_offset: None,
            data_width: 24,
            embedded_bit_offset: 8,
        };
        let scaling = entry.to_scaling().unwrap();
        assert!(scaling.transform.is_none());
        assert_eq!(scaling.embedded_bit_offset, 8);
    }

    #[test]
    fn test_bad_range_text() {
        let entry = ChannelScalingConfig {
            name: "AI0".to_string(),
            range: Some("volts".to_string()),
            scale_value: None,
            scale_offset: None,
            data_width: 24,
            embedded_bit_offset: 0,
        };
        assert!(matches!(entry.to_scaling(), Err(ReaderError::Scale(_))));
    }

    #[test]
    fn test_load_from_file_with_env_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
decode_mode = "raw"
delay_coupling = "all_channels"
block_size = 500
sample_rate_hz = 1000.0
sample_counter_channel = "CNT0"

[[channels]]
name = "AI0"
range = "10 V"
"#
        )
        .unwrap();

        std::env::set_var("ACQ_AUTO_RELEASE", "false");
        let config = ReaderConfig::load(file.path()).unwrap();
        std::env::remove_var("ACQ_AUTO_RELEASE");

        assert_eq!(config.decode_mode, DecodeMode::Raw);
        assert_eq!(config.delay_coupling, DelayCoupling::AllChannels);
        assert!(!config.auto_release);
        assert_eq!(config.polling_interval(), Duration::from_millis(500));
        assert_eq!(config.sample_counter_channel.as_deref(), Some("CNT0"));
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.channels[0].data_width, 24);

        let scaling = config.channel_scaling().unwrap();
        assert!(scaling["AI0"].transform.is_some());
    }
}
