use window_ipc::error::{ConfigError, RegistryError, TransportError};

use common::{ContractError, ErrorLocation};

use std::panic::Location;

use thiserror::Error;

/// Errors that stop the host application.
///
/// Library errors are flattened to their message here; the location is
/// where the host observed them.
#[derive(Debug, Error)]
pub enum HostError {
    /// Error from this App
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    /// Configuration could not be loaded, overridden or saved
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// The window contracts are malformed
    #[error("Contract Error: {message} {location}")]
    Contract {
        message: String,
        location: ErrorLocation,
    },

    /// The WebSocket host failed to start
    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    /// The window bookkeeping actor is gone
    #[error("State Error: {message} {location}")]
    State {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ConfigError> for HostError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        HostError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<RegistryError> for HostError {
    #[track_caller]
    fn from(error: RegistryError) -> Self {
        HostError::Contract {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ContractError> for HostError {
    #[track_caller]
    fn from(error: ContractError) -> Self {
        HostError::Contract {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<TransportError> for HostError {
    #[track_caller]
    fn from(error: TransportError) -> Self {
        HostError::Transport {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
