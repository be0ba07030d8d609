use crate::error::client::ClientError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BridgeError {
    #[error("Already Exposed Error: a global named '{key}' already exists {location}")]
    AlreadyExposed { key: String, location: ErrorLocation },

    /// Untrusted code reached for something that was never exposed.
    #[error("Not Exposed Error: '{key}.{method}' is not a function {location}")]
    NotExposed {
        key: String,
        method: String,
        location: ErrorLocation,
    },

    #[error("Invalid Method Name Error: '{method}' {location}")]
    InvalidMethodName {
        method: String,
        location: ErrorLocation,
    },

    #[error("Undeclared Method Error: '{method}' is not declared for window '{window}' {location}")]
    UndeclaredMethod {
        window: String,
        method: String,
        location: ErrorLocation,
    },

    #[error("Disconnected Error: {message} {location}")]
    Disconnected {
        message: String,
        location: ErrorLocation,
    },

    #[error("Call Error: {source} {location}")]
    Call {
        #[source]
        source: ClientError,
        location: ErrorLocation,
    },
}

impl From<ClientError> for BridgeError {
    #[track_caller]
    fn from(error: ClientError) -> Self {
        BridgeError::Call {
            source: error,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
