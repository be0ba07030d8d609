use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Failures of the transport itself, as opposed to a handler answering with
/// a failure envelope.
#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("No handler registered for '{channel}' {location}")]
    NoHandler {
        channel: String,
        location: ErrorLocation,
    },

    #[error("Attempted to register a second handler for '{channel}' {location}")]
    HandlerAlreadyRegistered {
        channel: String,
        location: ErrorLocation,
    },

    #[error("Disconnected Error: {message} {location}")]
    Disconnected {
        message: String,
        location: ErrorLocation,
    },

    /// The remote end reported a transport-level failure for a request.
    #[error("Rejected Error: {message} {location}")]
    Rejected {
        message: String,
        location: ErrorLocation,
    },

    #[error("Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    #[error("Auth Error: {message} {location}")]
    Auth {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },

    #[error("Frame Error: {message} {location}")]
    Frame {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid URL Error: {message} {location}")]
    InvalidUrl {
        message: String,
        location: ErrorLocation,
    },
}

impl From<IoError> for TransportError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        TransportError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        TransportError::Frame {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
