pub mod bridge;
pub mod client;
pub mod config;
pub mod controller;
pub mod handler;
pub mod registry;
pub mod transport;

pub use bridge::BridgeError;
pub use client::ClientError;
pub use config::ConfigError;
pub use controller::ControllerError;
pub use handler::HandlerError;
pub use registry::RegistryError;
pub use transport::TransportError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
