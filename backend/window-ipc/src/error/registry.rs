use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Configuration errors raised while building the handler registry.
///
/// All of these are fatal at startup: a process with a malformed contract
/// must not start serving windows.
#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("Duplicate Method Error: '{method}' is already registered for window type '{window_type}' {location}")]
    DuplicateMethod {
        window_type: String,
        method: String,
        location: ErrorLocation,
    },

    #[error("Invalid Method Name Error: '{method}' on window type '{window_type}' {location}")]
    InvalidMethodName {
        window_type: String,
        method: String,
        location: ErrorLocation,
    },

    #[error("Reserved Method Name Error: '{method}' on window type '{window_type}' is owned by the controller {location}")]
    ReservedMethodName {
        window_type: String,
        method: String,
        location: ErrorLocation,
    },

    #[error("Undeclared Window Type Error: methods {methods:?} were registered for '{window_type}' but the type was never declared {location}")]
    UndeclaredWindowType {
        window_type: String,
        methods: Vec<String>,
        location: ErrorLocation,
    },
}
