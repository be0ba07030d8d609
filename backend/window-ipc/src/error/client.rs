use crate::error::transport::TransportError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ClientError {
    /// The handler answered with `success: false`; Display is the handler's
    /// message (or "Unknown error").
    #[error("{message}")]
    Remote {
        message: String,
        location: ErrorLocation,
    },

    /// The request never reached a handler, or no answer came back.
    #[error("Client Transport Error: {source} {location}")]
    Transport {
        #[source]
        source: TransportError,
        location: ErrorLocation,
    },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Ready Error: {message} {location}")]
    NotReady {
        message: String,
        location: ErrorLocation,
    },
}

impl ClientError {
    /// True when the handler itself reported the failure.
    pub fn is_remote(&self) -> bool {
        matches!(self, ClientError::Remote { .. })
    }
}

impl From<TransportError> for ClientError {
    #[track_caller]
    fn from(error: TransportError) -> Self {
        ClientError::Transport {
            source: error,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
