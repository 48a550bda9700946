//! Inventory and settings loading.
//!
//! The inventory is a JSON array of device descriptors; settings are an optional TOML file.
//! Durations in the settings file are humantime strings (`"10s"`, `"1m 30s"`).

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::parsers::CISCO_IOS;

pub const DEFAULT_STP_COMMAND: &str = "show spanning-tree";
pub const DEFAULT_CDP_COMMAND: &str = "show cdp neighbors";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse inventory {path}: {source}")]
    Inventory {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to parse settings {path}: {source}")]
    Settings {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One switch to probe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceDescriptor {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Enable secret. When present the session enters privileged EXEC mode.
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_device_type")]
    pub device_type: String,
    #[serde(default = "default_stp_command")]
    pub spanning_tree_command: String,
    #[serde(default = "default_cdp_command")]
    pub cdp_neighbors_command: String,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_device_type() -> String {
    CISCO_IOS.to_string()
}

fn default_stp_command() -> String {
    DEFAULT_STP_COMMAND.to_string()
}

fn default_cdp_command() -> String {
    DEFAULT_CDP_COMMAND.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Upper bound on concurrent probes; the pool is `min(devices, max_workers)`.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_connect_timeout", deserialize_with = "humantime_duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_command_timeout", deserialize_with = "humantime_duration")]
    pub command_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
        }
    }
}

fn default_max_workers() -> usize {
    32
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => {
                let text = read(path)?;
                toml::from_str(&text).map_err(|source| ConfigError::Settings {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Settings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.collector.max_workers == 0 {
            return Err(ConfigError::Invalid("collector.max_workers must be at least 1".to_string()));
        }
        if self.collector.connect_timeout.is_zero() || self.collector.command_timeout.is_zero() {
            return Err(ConfigError::Invalid("collector timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

pub fn load_inventory(path: &Path) -> Result<Vec<DeviceDescriptor>, ConfigError> {
    let text = read(path)?;
    parse_inventory(&text).map_err(|e| match e {
        InventoryError::Json(source) => ConfigError::Inventory {
            path: path.to_path_buf(),
            source,
        },
        InventoryError::Invalid(msg) => ConfigError::Invalid(format!("{}: {msg}", path.display())),
    })
}

enum InventoryError {
    Json(serde_json::Error),
    Invalid(String),
}

fn parse_inventory(text: &str) -> Result<Vec<DeviceDescriptor>, InventoryError> {
    let devices: Vec<DeviceDescriptor> = serde_json::from_str(text).map_err(InventoryError::Json)?;
    if let Some(index) = devices.iter().position(|device| device.host.trim().is_empty()) {
        return Err(InventoryError::Invalid(format!("device #{index} has an empty host")));
    }
    Ok(devices)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
