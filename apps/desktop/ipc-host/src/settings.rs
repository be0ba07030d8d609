//! Host-side configuration: directories, environment overrides and the
//! connection file handed to presentation processes.

use crate::error::HostError;

use window_ipc::IpcConfig;

use common::{AuthToken, ErrorLocation};

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const APP_DIR_NAME: &str = "window-ipc";
pub const CONNECTION_FILE_NAME: &str = "ipc-connection.json";

pub const PORT_ENV: &str = "WINDOW_IPC_PORT";
pub const HANDSHAKE_INTERVAL_ENV: &str = "WINDOW_IPC_HANDSHAKE_INTERVAL_MS";

/// `{config_dir}/window-ipc`, or the working directory when the platform
/// has no config directory.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `{data_local_dir}/window-ipc/logs`, or `./logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Load `ipc.json` from `config_dir` and apply environment overrides.
pub fn load_config(config_dir: &Path) -> Result<IpcConfig, HostError> {
    let mut config = IpcConfig::load(config_dir)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Apply `WINDOW_IPC_*` overrides read through `lookup`.
///
/// # Errors
///
/// [`HostError::Config`] when a variable is set but not a number.
#[track_caller]
pub fn apply_env_overrides<F>(config: &mut IpcConfig, lookup: F) -> Result<(), HostError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(PORT_ENV) {
        config.transport.port = port.trim().parse().map_err(|e| HostError::Config {
            message: format!("{PORT_ENV}={port}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;
        info!("Port overridden by {PORT_ENV}: {}", config.transport.port);
    }

    if let Some(interval) = lookup(HANDSHAKE_INTERVAL_ENV) {
        config.handshake.interval_ms =
            interval.trim().parse().map_err(|e| HostError::Config {
                message: format!("{HANDSHAKE_INTERVAL_ENV}={interval}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
        info!(
            "Handshake interval overridden by {HANDSHAKE_INTERVAL_ENV}: {}ms",
            config.handshake.interval_ms
        );
    }

    Ok(())
}

/// Where and how a presentation process connects to this host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub url: String,
    pub auth_token: String,
}

impl ConnectionInfo {
    pub fn new(url: impl Into<String>, auth_token: &AuthToken) -> Self {
        Self {
            url: url.into(),
            auth_token: auth_token.as_str().to_string(),
        }
    }

    pub fn token(&self) -> AuthToken {
        AuthToken::new(self.auth_token.as_str())
    }

    /// Write `{config_dir}/ipc-connection.json` using temp file + rename.
    pub fn save(&self, config_dir: &Path) -> Result<(), HostError> {
        std::fs::create_dir_all(config_dir).map_err(|e| HostError::Config {
            message: format!("Failed to create {}: {e}", config_dir.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let path = config_dir.join(CONNECTION_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONNECTION_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| HostError::Config {
            message: format!("Failed to serialize connection info: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| HostError::Config {
            message: format!("Failed to write {}: {e}", temp_path.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        std::fs::rename(&temp_path, &path).map_err(|e| HostError::Config {
            message: format!("Failed to write {}: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("Connection info written to {}", path.display());
        Ok(())
    }

    pub fn load(config_dir: &Path) -> Result<Self, HostError> {
        let path = config_dir.join(CONNECTION_FILE_NAME);
        let contents = std::fs::read_to_string(&path).map_err(|e| HostError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;
        serde_json::from_str(&contents).map_err(|e| HostError::Config {
            message: format!("Invalid connection file {}: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Remove the connection file; a missing file is not an error.
    pub fn remove(config_dir: &Path) {
        let path = config_dir.join(CONNECTION_FILE_NAME);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {e}", path.display()),
        }
    }
}
