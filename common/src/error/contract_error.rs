use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Errors reading or writing a contract manifest.
#[derive(Debug, ThisError)]
pub enum ContractError {
    #[error("Contract Parse Error: {message} {location}")]
    Parse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Contract Serialize Error: {message} {location}")]
    Serialize {
        message: String,
        location: ErrorLocation,
    },
}
