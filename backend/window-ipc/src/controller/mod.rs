//! Host-side controller of one live window.
//!
//! A controller owns the window's id and every scoped channel registered on
//! its behalf. It installs the registry's handlers for the window type plus
//! the implicit close handler, runs the initial data handshake after each
//! load and releases everything when the window closes.
//!
//! Controllers must be built inside a Tokio runtime: lifecycle events and the
//! handshake run on spawned tasks.

pub mod builder;

mod envelope;
mod handshake;
mod response_wait;

pub use builder::WindowControllerBuilder;

use crate::context::WindowContext;
use crate::error::controller::ControllerError;
use crate::registry::{HandlerRegistry, MethodContract};
use crate::transport::{
    HostTransport, RequestHandler, WindowHandle, WindowState, request_handler,
};
use envelope::envelope_handler;
use handshake::Handshake;
use response_wait::{PendingResponses, ResponseWait};

use common::channel::{CLOSE_METHOD, scoped_name};
use common::{ErrorLocation, WindowId};

use std::collections::BTreeMap;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use log::{debug, error, info};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct ChannelRecord {
    method: String,
}

pub(crate) struct ControllerInner {
    window_id: WindowId,
    window_type: Arc<str>,
    window: Arc<dyn WindowHandle>,
    transport: Arc<dyn HostTransport>,
    data: Map<String, Value>,
    response_timeout: Option<Duration>,
    channels: Mutex<BTreeMap<String, ChannelRecord>>,
    pending_responses: Arc<PendingResponses>,
    handshake: Handshake,
    torn_down: AtomicBool,
}

impl ControllerInner {
    fn lock_channels(&self) -> MutexGuard<'_, BTreeMap<String, ChannelRecord>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn context(&self) -> WindowContext {
        WindowContext::new(
            self.window_id.clone(),
            Arc::clone(&self.window_type),
            Arc::clone(&self.window),
        )
    }

    #[track_caller]
    fn install(&self, method: &str, contract: MethodContract) -> Result<(), ControllerError> {
        let channel = scoped_name(&self.window_id, method);
        let handler = if contract.needs_renderer_ack() {
            ResponseWait {
                channel: channel.clone(),
                method: method.to_string(),
                context: self.context(),
                contract,
                transport: Arc::downgrade(&self.transport),
                pending: Arc::clone(&self.pending_responses),
                timeout: self.response_timeout,
            }
            .into_handler()
        } else {
            envelope_handler(channel.clone(), self.context(), contract)
        };
        self.install_raw(method, channel, handler)
    }

    #[track_caller]
    fn install_close(&self) -> Result<(), ControllerError> {
        let window: Weak<dyn WindowHandle> = Arc::downgrade(&self.window);
        let window_id = self.window_id.clone();
        let handler = request_handler(move |_| {
            info!("Close requested by window {window_id}");
            if let Some(window) = window.upgrade() {
                window.close();
            }
            async { Value::Null }
        });
        self.install_raw(CLOSE_METHOD, scoped_name(&self.window_id, CLOSE_METHOD), handler)
    }

    #[track_caller]
    fn install_raw(
        &self,
        method: &str,
        channel: String,
        handler: RequestHandler,
    ) -> Result<(), ControllerError> {
        let mut channels = self.lock_channels();
        // Checked under the channel lock so teardown cannot miss a late install
        if self.torn_down.load(Ordering::SeqCst) {
            debug!("Refusing handler on '{channel}': window {} torn down", self.window_id);
            return Err(ControllerError::Closed {
                window_id: self.window_id.to_string(),
                channel,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if channels.contains_key(&channel) {
            error!("Handler already registered for channel: {channel}");
            return Err(ControllerError::DuplicateHandler {
                channel,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.transport
            .handle(&channel, handler)
            .map_err(|source| ControllerError::Transport {
                channel: channel.clone(),
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!("Installed handler on '{channel}'");
        channels.insert(
            channel,
            ChannelRecord {
                method: method.to_string(),
            },
        );
        Ok(())
    }

    fn remove_handler(&self, method: &str) -> bool {
        let channel = scoped_name(&self.window_id, method);
        let removed = self.lock_channels().remove(&channel).is_some();
        if removed {
            self.transport.remove_handler(&channel);
            debug!("Removed handler on '{channel}'");
        }
        removed
    }

    fn remove_all_handlers(&self) -> usize {
        let channels = std::mem::take(&mut *self.lock_channels());
        for (channel, record) in &channels {
            self.transport.remove_handler(channel);
            debug!("Removed handler '{}' on '{channel}'", record.method);
        }
        channels.len()
    }

    fn on_content_loaded(&self) {
        if self.torn_down.load(Ordering::SeqCst) {
            return;
        }

        let mut payload = self.data.clone();
        payload.insert(
            String::from("windowId"),
            Value::String(self.window_id.to_string()),
        );

        if let Err(e) = self.handshake.start(
            &self.window_id,
            Arc::clone(&self.window),
            self.transport.as_ref(),
            Value::Object(payload),
        ) {
            error!("Failed to start handshake for window {}: {e}", self.window_id);
        }
    }

    fn teardown(&self) -> usize {
        let first = !self.torn_down.swap(true, Ordering::SeqCst);

        self.handshake.stop(&self.window_id, self.transport.as_ref());
        let released = self.pending_responses.release_all(self.transport.as_ref());
        let removed = self.remove_all_handlers();

        if first {
            info!(
                "Window {} ({}) torn down: {removed} handler(s), {released} pending response(s) released",
                self.window_id, self.window_type
            );
        }
        removed
    }
}

/// Controller of one live window. Dropping it tears the window's channels
/// down.
pub struct WindowController {
    inner: Arc<ControllerInner>,
    events: Option<JoinHandle<()>>,
}

impl WindowController {
    pub(crate) fn start(inner: ControllerInner, registry: &HandlerRegistry) -> Self {
        let inner = Arc::new(inner);

        let contract = registry.lookup(&inner.window_type);
        if contract.is_empty() {
            debug!("Window type '{}' declares no methods", inner.window_type);
        }
        for (method, method_contract) in contract {
            if let Err(e) = inner.install(method, method_contract.clone()) {
                error!("Failed to install '{method}' for window {}: {e}", inner.window_id);
            }
        }
        if let Err(e) = inner.install_close() {
            error!("Failed to install close handler for window {}: {e}", inner.window_id);
        }

        let events = spawn_event_pump(Arc::downgrade(&inner), inner.window.subscribe());

        info!(
            "Window {} ({}) controller ready with {} channel(s)",
            inner.window_id,
            inner.window_type,
            inner.lock_channels().len()
        );

        Self {
            inner,
            events: Some(events),
        }
    }

    pub fn window_id(&self) -> &WindowId {
        &self.inner.window_id
    }

    pub fn window_type(&self) -> &str {
        &self.inner.window_type
    }

    pub fn window(&self) -> &Arc<dyn WindowHandle> {
        &self.inner.window
    }

    /// Scoped channels currently owned by this window, sorted.
    pub fn channels(&self) -> Vec<String> {
        self.inner.lock_channels().keys().cloned().collect()
    }

    pub fn has_channel(&self, channel: &str) -> bool {
        self.inner.lock_channels().contains_key(channel)
    }

    /// Install an extra handler on `"<id>:<method>"`.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::DuplicateHandler`] when the channel is taken; the
    ///   existing handler stays in place
    /// - [`ControllerError::Closed`] once the window has been torn down
    #[track_caller]
    pub fn handle(&self, method: &str, contract: MethodContract) -> Result<(), ControllerError> {
        self.inner.install(method, contract)
    }

    pub fn remove_handler(&self, method: &str) -> bool {
        self.inner.remove_handler(method)
    }

    /// Release every owned channel, the close handler included. Returns how
    /// many were released; a second call returns 0.
    pub fn remove_all_handlers(&self) -> usize {
        self.inner.remove_all_handlers()
    }

    pub fn close_window(&self) {
        self.inner.window.close();
    }

    /// Start (or restart) the initial data handshake.
    pub fn on_content_loaded(&self) {
        self.inner.on_content_loaded();
    }

    /// Tear down after the window closed. Safe to call repeatedly.
    pub fn on_closed(&self) -> usize {
        self.inner.teardown()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    pub fn is_acknowledged(&self) -> bool {
        self.inner.handshake.is_acknowledged()
    }

    pub fn is_broadcasting(&self) -> bool {
        self.inner.handshake.is_broadcasting()
    }

    pub fn pending_response_count(&self) -> usize {
        self.inner.pending_responses.len()
    }
}

impl Drop for WindowController {
    fn drop(&mut self) {
        if let Some(events) = self.events.take() {
            events.abort();
        }
        self.inner.teardown();
    }
}

fn spawn_event_pump(
    inner: Weak<ControllerInner>,
    mut states: watch::Receiver<WindowState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_generation = 0;
        loop {
            let state = *states.borrow_and_update();
            match state {
                WindowState::Loaded { generation } if generation != last_generation => {
                    last_generation = generation;
                    let Some(inner) = inner.upgrade() else { break };
                    inner.on_content_loaded();
                }
                WindowState::Closed => {
                    if let Some(inner) = inner.upgrade() {
                        inner.teardown();
                    }
                    break;
                }
                _ => {}
            }

            if states.changed().await.is_err() {
                break;
            }
        }
    })
}
