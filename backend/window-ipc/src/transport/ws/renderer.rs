//! Presentation side of the WebSocket transport.

use crate::error::transport::TransportError;
use crate::transport::listener_table::ListenerTable;
use crate::transport::ws::frame::WireFrame;
use crate::transport::{BroadcastListener, Payload, RendererTransport};

use common::{AuthToken, ErrorLocation};

use std::collections::HashMap;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use log::{debug, info, trace, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep as TokioSleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

type ReplySender = oneshot::Sender<Result<Payload, TransportError>>;

#[derive(Default)]
struct PendingReplies {
    senders: Mutex<HashMap<u64, ReplySender>>,
}

impl PendingReplies {
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, ReplySender>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, id: u64, sender: ReplySender) {
        self.lock().insert(id, sender);
    }

    fn take(&self, id: u64) -> Option<ReplySender> {
        self.lock().remove(&id)
    }

    /// Drop every sender; the waiting invokes see a disconnect.
    fn fail_all(&self) -> usize {
        let senders = std::mem::take(&mut *self.lock());
        senders.len()
    }
}

/// Renderer connection to a [`start_ws_host`](crate::transport::ws::start_ws_host) server.
pub struct WsRendererTransport {
    outbound: mpsc::UnboundedSender<Message>,
    pending: Arc<PendingReplies>,
    listeners: Arc<ListenerTable>,
    connected: Arc<AtomicBool>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl WsRendererTransport {
    /// Connect, authenticate and announce `window` as the window type.
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidUrl`] unless `url` is a `ws://` URL
    /// - [`TransportError::Handshake`] if the connection or upgrade fails
    /// - [`TransportError::Auth`] if the host rejects the token
    pub async fn connect(
        url: &str,
        token: &AuthToken,
        window: &str,
    ) -> Result<Arc<Self>, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            message: format!("{url}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;
        if parsed.scheme() != "ws" {
            return Err(TransportError::InvalidUrl {
                message: format!("{url}: expected ws:// scheme"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Handshake {
                message: format!("Failed to connect to {url}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let (mut write, mut read) = ws_stream.split();

        let hello = WireFrame::Hello {
            token: token.as_str().to_string(),
            window: window.to_string(),
        };
        write
            .send(Message::Text(hello.encode()?.into()))
            .await
            .map_err(|e| TransportError::Handshake {
                message: format!("Failed to send hello: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        match read.next().await {
            Some(Ok(Message::Text(text))) => match WireFrame::decode(text.as_str())? {
                WireFrame::HelloResult { success: true, .. } => {
                    info!("Connected to IPC host at {url} as '{window}'");
                }
                WireFrame::HelloResult { error, .. } => {
                    return Err(TransportError::Auth {
                        message: error.unwrap_or_else(|| String::from("Authentication rejected")),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                other => {
                    return Err(TransportError::Handshake {
                        message: format!("Expected hello_result, got '{}'", other.kind()),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            },
            _ => {
                return Err(TransportError::Handshake {
                    message: String::from("Connection closed during hello"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        let pending = Arc::new(PendingReplies::default());
        let listeners = Arc::new(ListenerTable::new());
        let connected = Arc::new(AtomicBool::new(true));

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let writer = TokioSpawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = write.send(message).await {
                    debug!("Write to IPC host failed: {e}");
                    break;
                }
            }
            let _ = write.close().await;
        });

        let reader = {
            let pending = Arc::clone(&pending);
            let listeners = Arc::clone(&listeners);
            let connected = Arc::clone(&connected);
            TokioSpawn(async move {
                while let Some(message) = read.next().await {
                    match message {
                        Ok(Message::Text(text)) => match WireFrame::decode(text.as_str()) {
                            Ok(WireFrame::Reply { id, payload, error }) => {
                                let Some(sender) = pending.take(id) else {
                                    trace!("Reply {id} has no waiting invoke");
                                    continue;
                                };
                                let result = match error {
                                    None => Ok(payload),
                                    Some(message) => Err(TransportError::Rejected {
                                        message,
                                        location: ErrorLocation::from(Location::caller()),
                                    }),
                                };
                                let _ = sender.send(result);
                            }
                            Ok(WireFrame::Broadcast { channel, payload }) => {
                                if listeners.emit(&channel, &payload) == 0 {
                                    trace!("No listener on '{channel}', broadcast lost");
                                }
                            }
                            Ok(other) => warn!("Unexpected '{}' frame from IPC host", other.kind()),
                            Err(e) => warn!("Invalid frame from IPC host: {e}"),
                        },
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            debug!("Error reading from IPC host: {e}");
                            break;
                        }
                    }
                }

                connected.store(false, Ordering::SeqCst);
                let failed = pending.fail_all();
                info!("Disconnected from IPC host ({failed} pending invoke(s) failed)");
            })
        };

        Ok(Arc::new(Self {
            outbound,
            pending,
            listeners,
            connected,
            next_id: AtomicU64::new(1),
            reader,
            writer,
        }))
    }

    /// [`WsRendererTransport::connect`] with exponential backoff until
    /// `max_elapsed`. An auth rejection is not retried.
    pub async fn connect_with_retry(
        url: &str,
        token: &AuthToken,
        window: &str,
        max_elapsed: Duration,
    ) -> Result<Arc<Self>, TransportError> {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(max_elapsed),
            ..Default::default()
        };

        loop {
            let error = match Self::connect(url, token, window).await {
                Ok(transport) => return Ok(transport),
                Err(e @ (TransportError::Auth { .. } | TransportError::InvalidUrl { .. })) => {
                    return Err(e);
                }
                Err(e) => e,
            };

            match backoff.next_backoff() {
                Some(duration) => {
                    trace!("IPC host not ready ({error}), retrying after {duration:?}");
                    TokioSleep(duration).await;
                }
                None => {
                    warn!("Giving up on IPC host at {url} after {max_elapsed:?}");
                    return Err(error);
                }
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn disconnect(&self) {
        let _ = self.outbound.send(Message::Close(None));
    }

    #[track_caller]
    fn disconnected(channel: &str) -> TransportError {
        TransportError::Disconnected {
            message: format!("Not connected to IPC host, cannot invoke '{channel}'"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl RendererTransport for WsRendererTransport {
    fn invoke(
        &self,
        channel: &str,
        payload: Payload,
    ) -> BoxFuture<'static, Result<Payload, TransportError>> {
        let channel = channel.to_string();
        if !self.is_connected() {
            return futures_util::future::ready(Err(Self::disconnected(&channel))).boxed();
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.insert(id, reply_tx);

        let frame = WireFrame::Invoke {
            id,
            channel: channel.clone(),
            payload,
        };
        let sent = frame
            .encode()
            .map(|text| self.outbound.send(Message::Text(text.into())).is_ok());

        match sent {
            Err(e) => {
                self.pending.take(id);
                return futures_util::future::ready(Err(e)).boxed();
            }
            Ok(false) => {
                self.pending.take(id);
                return futures_util::future::ready(Err(Self::disconnected(&channel))).boxed();
            }
            Ok(true) => {}
        }

        // The reader may have drained pending replies before the insert above
        if !self.is_connected() && self.pending.take(id).is_some() {
            return futures_util::future::ready(Err(Self::disconnected(&channel))).boxed();
        }

        async move {
            match reply_rx.await {
                Ok(result) => result,
                Err(_) => Err(Self::disconnected(&channel)),
            }
        }
        .boxed()
    }

    fn once(&self, channel: &str, listener: BroadcastListener) {
        self.listeners.add(channel, listener);
    }
}

impl Drop for WsRendererTransport {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}
