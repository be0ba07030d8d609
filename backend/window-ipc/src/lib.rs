//! Window-scoped request/response IPC between a privileged host and its
//! sandboxed presentation surfaces.
//!
//! # Architecture
//!
//! - [`registry`]: process-wide window contracts, frozen before any window opens
//! - [`controller`]: one per live window; installs, tears down and drives the
//!   initial data handshake
//! - [`client`]: presentation-side proxy unwrapping response envelopes
//! - [`bridge`]: the only path by which untrusted page code reaches a proxy
//! - [`transport`]: the message-passing capability both sides consume, with an
//!   in-process and a WebSocket implementation

pub mod bridge;
pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod registry;
pub mod transport;

#[cfg(test)]
mod tests;

pub use client::{IpcClient, RawClient};
pub use config::IpcConfig;
pub use context::WindowContext;
pub use controller::{WindowController, WindowControllerBuilder};
pub use registry::{HandlerRegistry, MethodContract, RegistryBuilder, WindowContract};
pub use transport::{
    HostTransport, MainWorld, Payload, RendererTransport, WindowHandle, WindowState,
};

pub const DEFAULT_IPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_IPC_PORT: u16 = 19876;
pub const DEFAULT_IPC_URL: &str = const_format::concatcp!("ws://", DEFAULT_IPC_HOST, ":", DEFAULT_IPC_PORT);
