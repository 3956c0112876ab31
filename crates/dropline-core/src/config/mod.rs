//! Configuration management for Dropline.
//!
//! Configuration is read-only from the library's point of view: a missing
//! file means defaults, and nothing is ever written back.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/dropline/config.toml` |
//! | macOS | `~/Library/Application Support/Dropline/config.toml` |
//! | Windows | `%APPDATA%\Dropline\config.toml` |
//!
//! ## Example
//!
//! ```toml
//! [general]
//! device_name = "studio-mac"
//! output_dir = "/home/me/Downloads"
//!
//! [discovery]
//! port = 6969
//! interval = "500ms"
//! ```

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration struct for Dropline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Discovery settings
    pub discovery: DiscoveryConfig,
}

/// General configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Display name announced to peers
    pub device_name: String,
    /// Directory received files are written to (current directory if unset)
    pub output_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            device_name: hostname::get().map_or_else(
                |_| "Dropline Device".to_string(),
                |h| h.to_string_lossy().to_string(),
            ),
            output_dir: None,
        }
    }
}

/// Discovery configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Discovery port (UDP); both sides must agree on it
    pub port: u16,
    /// Pause between presence broadcasts
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Address presence broadcasts are sent to
    pub broadcast_address: Ipv4Addr,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: crate::DEFAULT_DISCOVERY_PORT,
            interval: crate::DEFAULT_BROADCAST_INTERVAL,
            broadcast_address: Ipv4Addr::BROADCAST,
        }
    }
}

impl DiscoveryConfig {
    /// Where presence broadcasts go: the broadcast address on the discovery port.
    #[must_use]
    pub fn broadcast_target(&self) -> SocketAddr {
        SocketAddrV4::new(self.broadcast_address, self.port).into()
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "dropline", "Dropline")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

mod humantime_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();

        let parsed = if let Some(ms) = s.strip_suffix("ms") {
            ms.parse().map(Duration::from_millis)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse().map(Duration::from_secs)
        } else if let Some(mins) = s.strip_suffix('m') {
            let mins: u64 = mins.parse().map_err(<D::Error as de::Error>::custom)?;
            let secs = mins.checked_mul(60).ok_or_else(|| {
                <D::Error as de::Error>::custom(format!("duration '{s}' is too long"))
            })?;
            Ok(Duration::from_secs(secs))
        } else {
            return Err(serde::de::Error::custom(format!(
                "invalid duration '{s}': use a suffix of ms, s or m"
            )));
        };

        parsed.map_err(serde::de::Error::custom)
    }
}
