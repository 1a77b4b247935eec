use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub broker: BrokerConfig,
    pub audio: AudioConfig,
    pub detection: DetectionConfig,
    pub transfer: TransferConfig,
    pub node: NodeConfig,
}

/// Broker session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub retry_interval_ms: u64,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub window_samples: usize,
    pub block_samples: usize,
}

/// Detection policy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    pub threshold: f32,
    pub excluded_labels: Vec<String>,
    pub low_range_floor: i32,
}

/// Chunked transfer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransferConfig {
    pub chunk_size: usize,
}

/// Per-node identity and trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    pub topic_prefix: String,
    pub wake_device_id: String,
    pub cam_device_id: String,
    pub signal_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: defaults::BROKER_HOST.to_string(),
            port: defaults::BROKER_PORT,
            retry_interval_ms: defaults::RETRY_INTERVAL.as_millis() as u64,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            window_samples: defaults::WINDOW_SAMPLES,
            block_samples: defaults::CAPTURE_BLOCK_SAMPLES,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::DETECTION_THRESHOLD,
            excluded_labels: defaults::EXCLUDED_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            low_range_floor: defaults::LOW_RANGE_FLOOR,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::CHUNK_SIZE,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            topic_prefix: defaults::TOPIC_PREFIX.to_string(),
            wake_device_id: defaults::WAKE_DEVICE_ID.to_string(),
            cam_device_id: defaults::CAM_DEVICE_ID.to_string(),
            signal_timeout_ms: defaults::SIGNAL_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - WAKECAM_BROKER_HOST → broker.host
    /// - WAKECAM_BROKER_PORT → broker.port
    /// - WAKECAM_TOPIC_PREFIX → node.topic_prefix
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("WAKECAM_BROKER_HOST")
            && !host.is_empty()
        {
            self.broker.host = host;
        }

        if let Ok(port) = std::env::var("WAKECAM_BROKER_PORT")
            && let Ok(port) = port.parse()
        {
            self.broker.port = port;
        }

        if let Ok(prefix) = std::env::var("WAKECAM_TOPIC_PREFIX")
            && !prefix.is_empty()
        {
            self.node.topic_prefix = prefix;
        }

        self
    }

    /// Validate cross-field invariants that serde defaults can't express.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.audio.window_samples == 0 {
            return Err(crate::error::WakecamError::ConfigInvalidValue {
                key: "audio.window_samples".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.block_samples == 0 {
            return Err(crate::error::WakecamError::ConfigInvalidValue {
                key: "audio.block_samples".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.transfer.chunk_size == 0 {
            return Err(crate::error::WakecamError::ConfigInvalidValue {
                key: "transfer.chunk_size".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.detection.threshold) {
            return Err(crate::error::WakecamError::ConfigInvalidValue {
                key: "detection.threshold".to_string(),
                message: "must be within [0, 1]".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.broker.host, "broker.hivemq.com");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.window_samples, 16000);
        assert_eq!(config.detection.threshold, 0.4);
        assert_eq!(config.transfer.chunk_size, 2048);
        assert_eq!(config.node.signal_timeout_ms, 10000);
    }

    #[test]
    fn test_default_excluded_labels_match_source_spellings() {
        let config = Config::default();
        assert_eq!(
            config.detection.excluded_labels,
            vec!["noise", "unknown", "_unknown", "background"]
        );
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[broker]
host = "test.mosquitto.org"

[detection]
threshold = 0.6
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.broker.host, "test.mosquitto.org");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.detection.threshold, 0.6);
        assert_eq!(config.transfer.chunk_size, 2048);
    }

    #[test]
    fn test_load_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "broker = not valid toml").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/wakecam.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = Config::default();
        config.transfer.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.detection.threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_roundtrip_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
