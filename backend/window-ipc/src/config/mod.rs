//! IPC configuration stored as `ipc.json` in the application's config
//! directory.

use crate::error::config::ConfigError;
use crate::{DEFAULT_IPC_HOST, DEFAULT_IPC_PORT};

use common::ErrorLocation;
use common::window_id::{WINDOW_ID_MAX_LENGTH, WINDOW_ID_MIN_LENGTH};

use std::net::IpAddr;
use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "ipc.json";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseWaitConfig {
    /// `None` waits for the page's response for as long as the window lives.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_max_elapsed_ms")]
    pub connect_max_elapsed_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_max_elapsed_ms: default_connect_max_elapsed_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub handshake: HandshakeConfig,

    #[serde(default)]
    pub response_wait: ResponseWaitConfig,

    #[serde(default = "default_window_id_length")]
    pub window_id_length: usize,

    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            handshake: HandshakeConfig::default(),
            response_wait: ResponseWaitConfig::default(),
            window_id_length: default_window_id_length(),
            transport: TransportConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_interval_ms() -> u64 {
    2000
}
fn default_window_id_length() -> usize {
    common::window_id::WINDOW_ID_LENGTH
}
fn default_host() -> String {
    DEFAULT_IPC_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_IPC_PORT
}
fn default_connect_max_elapsed_ms() -> u64 {
    10_000
}

// ============================================
// IMPLEMENTATION
// ============================================

impl IpcConfig {
    /// Load config from {config_dir}/ipc.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is unreadable, corrupted or invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "IPC config not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read IPC config: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: IpcConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse IPC config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("IPC config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/ipc.json using temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation,
    /// serialization, write or rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("IPC config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.handshake.interval_ms == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "handshake.interval_ms must be greater than 0".to_string(),
            });
        }

        if self.response_wait.timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "response_wait.timeout_ms must be greater than 0 when set".to_string(),
            });
        }

        if !(WINDOW_ID_MIN_LENGTH..=WINDOW_ID_MAX_LENGTH).contains(&self.window_id_length) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid window_id_length: {} (must be {}-{})",
                    self.window_id_length, WINDOW_ID_MIN_LENGTH, WINDOW_ID_MAX_LENGTH
                ),
            });
        }

        let loopback = self
            .transport
            .host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(self.transport.host == "localhost");
        if !loopback {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "transport.host must be a loopback address: {}",
                    self.transport.host
                ),
            });
        }

        Ok(())
    }

    pub fn handshake_interval(&self) -> Duration {
        Duration::from_millis(self.handshake.interval_ms)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_wait.timeout_ms.map(Duration::from_millis)
    }

    pub fn connect_max_elapsed(&self) -> Duration {
        Duration::from_millis(self.transport.connect_max_elapsed_ms)
    }

    /// `ws://host:port` the presentation side connects to.
    pub fn transport_url(&self) -> String {
        format!("ws://{}:{}", self.transport.host, self.transport.port)
    }
}
