use crate::error::transport::TransportError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ControllerError {
    /// The scoped channel already has a handler owned by this window.
    #[error("Duplicate Handler Error: Handler already registered for channel: {channel} {location}")]
    DuplicateHandler {
        channel: String,
        location: ErrorLocation,
    },

    /// The window closed and its channels were released.
    #[error("Window Closed Error: Cannot install '{channel}', window {window_id} is torn down {location}")]
    Closed {
        window_id: String,
        channel: String,
        location: ErrorLocation,
    },

    #[error("Controller Transport Error: {channel}: {source} {location}")]
    Transport {
        channel: String,
        #[source]
        source: TransportError,
        location: ErrorLocation,
    },

    #[error("Invalid Initial Data Error: {message} {location}")]
    InvalidInitialData {
        message: String,
        location: ErrorLocation,
    },
}
