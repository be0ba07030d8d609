//! In-process transport: host and presentation side share one address space.
//!
//! Used by tests and by embedders whose presentation layer runs inside the
//! host process. Semantics match the WebSocket transport: one handler per
//! channel, once-handlers consumed on first invoke, broadcasts with no
//! listener attached are lost.

use crate::error::transport::TransportError;
use crate::transport::handler_table::HandlerTable;
use crate::transport::listener_table::ListenerTable;
use crate::transport::{
    BroadcastListener, HostTransport, Payload, RendererTransport, RequestHandler, WindowHandle,
    WindowState,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{debug, trace};
use tokio::sync::watch;

#[derive(Default)]
pub struct LocalTransport {
    handlers: Arc<HandlerTable>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a presentation surface: the host keeps the window, the page gets
    /// the renderer. The window starts in [`WindowState::Loading`].
    pub fn open_window(&self, label: impl Into<String>) -> (Arc<LocalWindow>, Arc<LocalRenderer>) {
        let listeners = Arc::new(ListenerTable::new());
        let (state, _) = watch::channel(WindowState::Loading);

        let window = Arc::new(LocalWindow {
            label: label.into(),
            listeners: Arc::clone(&listeners),
            state,
            generation: AtomicU64::new(0),
        });
        let renderer = Arc::new(LocalRenderer {
            handlers: Arc::clone(&self.handlers),
            listeners,
        });

        (window, renderer)
    }

    pub fn has_handler(&self, channel: &str) -> bool {
        self.handlers.contains(channel)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn channels(&self) -> Vec<String> {
        self.handlers.channels()
    }
}

impl HostTransport for LocalTransport {
    fn handle(&self, channel: &str, handler: RequestHandler) -> Result<(), TransportError> {
        self.handlers.insert(channel, handler, false)
    }

    fn handle_once(&self, channel: &str, handler: RequestHandler) -> Result<(), TransportError> {
        self.handlers.insert(channel, handler, true)
    }

    fn remove_handler(&self, channel: &str) {
        if self.handlers.remove(channel) {
            trace!("Handler detached: {channel}");
        }
    }
}

pub struct LocalWindow {
    label: String,
    listeners: Arc<ListenerTable>,
    state: watch::Sender<WindowState>,
    generation: AtomicU64,
}

impl LocalWindow {
    /// Simulate the page finishing a (re)load.
    pub fn finish_load(&self) {
        if self.is_closed() {
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(WindowState::Loaded { generation });
    }

    pub fn state(&self) -> WindowState {
        *self.state.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == WindowState::Closed
    }
}

impl WindowHandle for LocalWindow {
    fn label(&self) -> &str {
        &self.label
    }

    fn send(&self, channel: &str, payload: Payload) {
        if self.is_closed() {
            debug!("Dropping broadcast on '{channel}': window '{}' is closed", self.label);
            return;
        }
        if self.listeners.emit(channel, &payload) == 0 {
            trace!("No listener on '{channel}', broadcast lost");
        }
    }

    fn close(&self) {
        if self.is_closed() {
            return;
        }
        self.listeners.clear();
        self.state.send_replace(WindowState::Closed);
        debug!("Window '{}' closed", self.label);
    }

    fn subscribe(&self) -> watch::Receiver<WindowState> {
        self.state.subscribe()
    }
}

pub struct LocalRenderer {
    handlers: Arc<HandlerTable>,
    listeners: Arc<ListenerTable>,
}

impl LocalRenderer {
    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners.count(channel)
    }
}

impl RendererTransport for LocalRenderer {
    fn invoke(
        &self,
        channel: &str,
        payload: Payload,
    ) -> BoxFuture<'static, Result<Payload, TransportError>> {
        let handlers = Arc::clone(&self.handlers);
        let channel = channel.to_string();
        async move { handlers.dispatch(&channel, payload).await }.boxed()
    }

    fn once(&self, channel: &str, listener: BroadcastListener) {
        self.listeners.add(channel, listener);
    }
}
