//! Configuration for the telemetry agent.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// Default collection service base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default device serial number.
pub const DEFAULT_SERIAL_NUMBER: &str = "FW-DEVICE-12345";

/// Default seconds between readings in continuous mode.
pub const DEFAULT_SEND_INTERVAL_SECS: u64 = 5;

/// Default seconds to wait for a stream acknowledgment before falling back.
pub const DEFAULT_ACK_TIMEOUT_SECS: u64 = 5;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Which transport the delivery controller should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportChoice {
    /// Stream transport with HTTP fallback.
    #[default]
    Auto,
    /// Stream transport only.
    Stream,
    /// HTTP transport only.
    Http,
}

impl FromStr for TransportChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "stream" => Ok(Self::Stream),
            "http" => Ok(Self::Http),
            other => Err(format!(
                "unknown transport '{other}' (expected auto, stream, or http)"
            )),
        }
    }
}

impl fmt::Display for TransportChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Stream => write!(f, "stream"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Main agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Collection service base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Device serial number reported with every reading.
    #[serde(default = "default_serial_number")]
    pub serial_number: String,
    /// Seconds between readings in continuous mode.
    #[serde(default = "default_send_interval_secs")]
    pub send_interval_secs: u64,
    /// Seconds to wait for a stream acknowledgment before falling back.
    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: u64,
    /// Transport selection.
    #[serde(default)]
    pub transport: TransportChoice,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_serial_number() -> String {
    DEFAULT_SERIAL_NUMBER.to_string()
}

fn default_send_interval_secs() -> u64 {
    DEFAULT_SEND_INTERVAL_SECS
}

fn default_ack_timeout_secs() -> u64 {
    DEFAULT_ACK_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            base_url: default_base_url(),
            serial_number: default_serial_number(),
            send_interval_secs: default_send_interval_secs(),
            ack_timeout_secs: default_ack_timeout_secs(),
            transport: TransportChoice::default(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then optional file, then environment.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        config.load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override configuration from `FIELDSENSE_*` environment variables.
    fn load_from_env(&mut self) -> CoreResult<()> {
        if let Ok(log_level) = std::env::var("FIELDSENSE_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(base_url) = std::env::var("FIELDSENSE_BASE_URL") {
            self.base_url = base_url;
        }
        if let Ok(serial_number) = std::env::var("FIELDSENSE_SERIAL_NUMBER") {
            self.serial_number = serial_number;
        }
        if let Ok(interval) = std::env::var("FIELDSENSE_SEND_INTERVAL") {
            self.send_interval_secs = interval
                .parse()
                .map_err(|_| CoreError::Config(format!("invalid send interval '{interval}'")))?;
        }
        if let Ok(timeout) = std::env::var("FIELDSENSE_ACK_TIMEOUT") {
            self.ack_timeout_secs = timeout
                .parse()
                .map_err(|_| CoreError::Config(format!("invalid ack timeout '{timeout}'")))?;
        }
        if let Ok(transport) = std::env::var("FIELDSENSE_TRANSPORT") {
            self.transport = transport.parse().map_err(CoreError::Config)?;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> CoreResult<()> {
        Url::parse(&self.base_url)?;
        if self.serial_number.trim().is_empty() {
            return Err(CoreError::Config("serial number is empty".to_string()));
        }
        if self.send_interval_secs == 0 {
            return Err(CoreError::Config("send interval must be at least 1s".to_string()));
        }
        Ok(())
    }

    /// Derive the stream endpoint URL from the base URL.
    pub fn stream_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let ws = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{ws}/stream")
    }

    /// The HTTP readings endpoint.
    pub fn readings_url(&self) -> String {
        format!("{}/api/device/readings", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.serial_number, "FW-DEVICE-12345");
        assert_eq!(config.send_interval_secs, 5);
        assert_eq!(config.ack_timeout_secs, 5);
        assert_eq!(config.transport, TransportChoice::Auto);
    }

    #[test]
    fn test_stream_url_derivation() {
        let config = Config {
            base_url: "http://farm.example.com:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.stream_url(), "ws://farm.example.com:8080/stream");

        let secure = Config {
            base_url: "https://farm.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(secure.stream_url(), "wss://farm.example.com/stream");
    }

    #[test]
    fn test_readings_url() {
        let config = Config::default();
        assert_eq!(
            config.readings_url(),
            "http://localhost:8080/api/device/readings"
        );
    }

    #[test]
    fn test_transport_choice_parse() {
        assert_eq!("auto".parse::<TransportChoice>(), Ok(TransportChoice::Auto));
        assert_eq!(
            "STREAM".parse::<TransportChoice>(),
            Ok(TransportChoice::Stream)
        );
        assert_eq!("http".parse::<TransportChoice>(), Ok(TransportChoice::Http));
        assert!("carrier-pigeon".parse::<TransportChoice>().is_err());
    }

    #[test]
    fn test_load_from_file_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"base_url": "http://device-lab:9090", "transport": "http"}}"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://device-lab:9090");
        assert_eq!(config.transport, TransportChoice::Http);
        // Missing fields fall back to defaults
        assert_eq!(config.serial_number, "FW-DEVICE-12345");
        assert_eq!(config.send_interval_secs, 5);
    }

    #[test]
    fn test_ack_timeout_env_override() {
        std::env::set_var("FIELDSENSE_ACK_TIMEOUT", "9");
        let config = Config::load(None).unwrap();
        std::env::remove_var("FIELDSENSE_ACK_TIMEOUT");

        assert_eq!(config.ack_timeout_secs, 9);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_url = Config {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());

        let empty_serial = Config {
            serial_number: "  ".to_string(),
            ..Default::default()
        };
        assert!(empty_serial.validate().is_err());

        let zero_interval = Config {
            send_interval_secs: 0,
            ..Default::default()
        };
        assert!(zero_interval.validate().is_err());
    }
}
