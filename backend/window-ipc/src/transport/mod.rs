//! The message-passing capability both sides of the IPC layer consume.
//!
//! The host side registers request handlers on named channels and pushes
//! fire-and-forget broadcasts to a window. The presentation side invokes
//! channels and listens once for broadcasts. Everything above this module is
//! written against these traits only.

pub mod handler_table;
pub mod listener_table;
pub mod local;
pub mod ws;

pub use handler_table::HandlerTable;
pub use listener_table::ListenerTable;
pub use local::{LocalRenderer, LocalTransport, LocalWindow};

use crate::error::bridge::BridgeError;
use crate::error::transport::TransportError;

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::watch;

/// Everything crossing a channel is plain JSON.
pub type Payload = Value;

/// Host-side request handler. Always produces a reply; envelope wrapping
/// happens above the transport.
pub type RequestHandler = Arc<dyn Fn(Payload) -> BoxFuture<'static, Payload> + Send + Sync>;

/// Presentation-side one-shot broadcast listener.
pub type BroadcastListener = Box<dyn FnOnce(Payload) + Send>;

/// Lifecycle of the presentation surface behind a [`WindowHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Loading,
    /// Content finished loading; the generation increases on every reload.
    Loaded { generation: u64 },
    Closed,
}

/// Host-side request/response registration.
pub trait HostTransport: Send + Sync {
    /// Fails with [`TransportError::HandlerAlreadyRegistered`] when the
    /// channel is taken.
    fn handle(&self, channel: &str, handler: RequestHandler) -> Result<(), TransportError>;

    /// Like [`HostTransport::handle`], but the handler is removed after its
    /// first invocation.
    fn handle_once(&self, channel: &str, handler: RequestHandler) -> Result<(), TransportError>;

    /// Removing a channel with no handler is a no-op.
    fn remove_handler(&self, channel: &str);
}

/// Presentation-side view of the transport.
pub trait RendererTransport: Send + Sync {
    fn invoke(
        &self,
        channel: &str,
        payload: Payload,
    ) -> BoxFuture<'static, Result<Payload, TransportError>>;

    /// Attach a listener for the next broadcast on `channel`.
    fn once(&self, channel: &str, listener: BroadcastListener);
}

/// Host-side handle on one presentation surface.
pub trait WindowHandle: Send + Sync {
    fn label(&self) -> &str;

    /// Fire-and-forget broadcast. Dropped when nothing is listening.
    fn send(&self, channel: &str, payload: Payload);

    fn close(&self);

    fn subscribe(&self) -> watch::Receiver<WindowState>;
}

/// One-time publication of an object into the untrusted page's global scope.
pub trait MainWorld: Send + Sync {
    fn expose_in_main_world(
        &self,
        key: &str,
        api: crate::bridge::ExposedApi,
    ) -> Result<(), BridgeError>;
}

/// Adapt an async closure into a [`RequestHandler`].
pub fn request_handler<F, Fut>(handler: F) -> RequestHandler
where
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Payload> + Send + 'static,
{
    Arc::new(move |payload| handler(payload).boxed())
}
