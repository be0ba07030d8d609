//! Requests completed by a follow-up message from the presentation side.
//!
//! For a method flagged `needs_renderer_ack` the request resolves with the
//! payload later invoked on `"<id>:<id>:<method>Response"`, not with the
//! handler's own result. Without a configured timeout a response that never
//! arrives leaves the request pending until the window closes.

use crate::context::WindowContext;
use crate::controller::envelope::run_handler;
use crate::registry::MethodContract;
use crate::transport::{HostTransport, RequestHandler, request_handler};

use common::ResponseEnvelope;
use common::channel::response_channel;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;
use tokio::sync::oneshot;

/// Response channels currently registered on the transport for in-flight
/// requests of one window.
#[derive(Debug, Default)]
pub(crate) struct PendingResponses {
    channels: Mutex<BTreeSet<String>>,
}

impl PendingResponses {
    fn lock(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, channel: String) {
        self.lock().insert(channel);
    }

    fn remove(&self, channel: &str) -> bool {
        self.lock().remove(channel)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Release every pending channel; their requests resolve as failures.
    pub(crate) fn release_all(&self, transport: &dyn HostTransport) -> usize {
        let channels = std::mem::take(&mut *self.lock());
        for channel in &channels {
            transport.remove_handler(channel);
        }
        channels.len()
    }
}

pub(crate) struct ResponseWait {
    pub(crate) channel: String,
    pub(crate) method: String,
    pub(crate) context: WindowContext,
    pub(crate) contract: MethodContract,
    pub(crate) transport: Weak<dyn HostTransport>,
    pub(crate) pending: Arc<PendingResponses>,
    pub(crate) timeout: Option<Duration>,
}

impl ResponseWait {
    pub(crate) fn into_handler(self) -> RequestHandler {
        let wait = Arc::new(self);
        request_handler(move |payload| {
            let wait = Arc::clone(&wait);
            async move { wait.respond(payload).await.into_value() }
        })
    }

    async fn respond(&self, payload: Value) -> ResponseEnvelope {
        let Some(transport) = self.transport.upgrade() else {
            return ResponseEnvelope::err(format!(
                "Transport for '{}' is no longer available",
                self.channel
            ));
        };

        let reply_channel = response_channel(self.context.window_id(), &self.method);
        let (reply_tx, reply_rx) = oneshot::channel::<Value>();
        let reply_tx = Mutex::new(Some(reply_tx));

        let registered = transport.handle_once(
            &reply_channel,
            request_handler(move |reply| {
                let sender = reply_tx
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(sender) = sender {
                    let _ = sender.send(reply);
                }
                async { Value::Null }
            }),
        );
        if let Err(e) = registered {
            warn!("Cannot wait on '{reply_channel}': {e}");
            return ResponseEnvelope::err(format!(
                "A response for '{}' is already pending",
                self.method
            ));
        }
        self.pending.insert(reply_channel.clone());
        debug!("Waiting for renderer response on '{reply_channel}'");

        // The handler's own result only matters when it fails
        let outcome = run_handler(
            &self.channel,
            self.contract.call(self.context.clone(), payload),
        )
        .await;
        if !outcome.success {
            self.release(transport.as_ref(), &reply_channel);
            return outcome;
        }

        let received = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, reply_rx).await {
                Ok(received) => received,
                Err(_) => {
                    warn!("Timed out after {limit:?} waiting on '{reply_channel}'");
                    self.release(transport.as_ref(), &reply_channel);
                    return ResponseEnvelope::err(format!(
                        "Timed out waiting for renderer response on '{reply_channel}'"
                    ));
                }
            },
            None => reply_rx.await,
        };

        self.pending.remove(&reply_channel);
        match received {
            Ok(reply) => {
                debug!("Renderer responded on '{reply_channel}'");
                ResponseEnvelope::ok(reply)
            }
            Err(_) => ResponseEnvelope::err(format!(
                "Window closed before responding on '{reply_channel}'"
            )),
        }
    }

    fn release(&self, transport: &dyn HostTransport, reply_channel: &str) {
        if self.pending.remove(reply_channel) {
            transport.remove_handler(reply_channel);
        }
    }
}
