//! Shared wire layer for the window IPC system.
//!
//! Everything in this crate is used identically by the host process and by
//! the presentation side, so both derive the same channel names and speak the
//! same envelope format without coordinating at runtime.
//!
//! ## Architecture
//!
//! - **common** (this crate): ids, channel naming, envelopes, contract markers
//! - **window-ipc**: registry, controllers, proxies, bridge and transports
//! - **ipc-host**: host application wiring everything together

pub mod auth_token;
pub mod channel;
pub mod contract;
pub mod envelope;
pub mod error;
pub mod window_id;

#[cfg(test)]
mod tests;

pub use auth_token::AuthToken;
pub use contract::{ContractManifest, MethodDeclaration, TypeShape, WindowMethod, WindowType};
pub use envelope::{ResponseEnvelope, UNKNOWN_ERROR};
pub use error::contract_error::ContractError;
pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use window_id::WindowId;
