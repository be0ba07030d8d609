//! WebSocket transport between the host process and presentation surfaces
//! running in other processes.
//!
//! # Protocol
//!
//! JSON text frames tagged by `type` (see [`frame::WireFrame`]):
//!
//! 1. The renderer's first frame **must** be `hello` carrying the auth token
//!    and the window type it wants to open
//! 2. The host answers `hello_result`; on failure the connection closes
//! 3. Afterwards the renderer sends `invoke` frames answered by `reply`
//!    frames with the same id, and the host pushes `broadcast` frames
//!
//! # Security
//!
//! - Binds to a loopback address only
//! - Rejects non-loopback peers before the WebSocket upgrade
//! - Fails closed on a wrong token or a wrong first frame

pub mod connection_state;
pub mod frame;
pub mod host;
pub mod renderer;

pub use frame::WireFrame;
pub use host::{WsHostTransport, WsServerHandle, WsWindow, start_ws_host};
pub use renderer::WsRendererTransport;
