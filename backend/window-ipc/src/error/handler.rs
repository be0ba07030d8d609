use common::{ErrorLocation, UNKNOWN_ERROR};

use std::fmt::Display;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Failure raised by application handler logic.
///
/// The Display text is exactly what the presentation side receives in the
/// envelope's `error` field, so it carries no location suffix; the location
/// is still recorded for logs.
#[derive(Debug, ThisError)]
pub enum HandlerError {
    #[error("{message}")]
    Failed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid params for '{method}': {reason}")]
    InvalidParams {
        method: String,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Failed to encode result of '{method}': {reason}")]
    Encode {
        method: String,
        reason: String,
        location: ErrorLocation,
    },

    /// A failure with no readable reason.
    #[error("{}", UNKNOWN_ERROR)]
    Unknown { location: ErrorLocation },
}

impl HandlerError {
    #[track_caller]
    pub fn new(message: impl Display) -> Self {
        HandlerError::Failed {
            message: message.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unknown() -> Self {
        HandlerError::Unknown {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn location(&self) -> ErrorLocation {
        match self {
            HandlerError::Failed { location, .. }
            | HandlerError::InvalidParams { location, .. }
            | HandlerError::Encode { location, .. }
            | HandlerError::Unknown { location } => *location,
        }
    }
}

impl From<String> for HandlerError {
    #[track_caller]
    fn from(message: String) -> Self {
        HandlerError::new(message)
    }
}

impl From<&str> for HandlerError {
    #[track_caller]
    fn from(message: &str) -> Self {
        HandlerError::new(message)
    }
}
