//! Host side of the WebSocket transport.

use crate::error::transport::TransportError;
use crate::transport::handler_table::HandlerTable;
use crate::transport::ws::connection_state::ConnectionState;
use crate::transport::ws::frame::WireFrame;
use crate::transport::{HostTransport, Payload, RequestHandler, WindowHandle, WindowState};

use common::{AuthToken, ErrorLocation};

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn as TokioSpawn;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Handler registrations served to every connected renderer.
#[derive(Default)]
pub struct WsHostTransport {
    handlers: Arc<HandlerTable>,
}

impl WsHostTransport {
    pub fn has_handler(&self, channel: &str) -> bool {
        self.handlers.contains(channel)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl HostTransport for WsHostTransport {
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

enum Outbound {
    Frame(String),
    Close,
}

/// Holds a requested close back until every in-flight invoke has queued its
/// reply, so a handler that closes its own window still answers.
struct CloseGate {
    in_flight: AtomicUsize,
    requested: AtomicBool,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl CloseGate {
    fn new(outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            requested: AtomicBool::new(false),
            outbound,
        }
    }

    fn enter(self: &Arc<Self>) -> InFlight {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight(Arc::clone(self))
    }

    fn leave(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1
            && self.requested.load(Ordering::SeqCst)
        {
            let _ = self.outbound.send(Outbound::Close);
        }
    }

    fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        if self.in_flight.load(Ordering::SeqCst) == 0 {
            let _ = self.outbound.send(Outbound::Close);
        }
    }
}

/// One invoke being answered. Drop it after the reply frame is queued.
struct InFlight(Arc<CloseGate>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.leave();
    }
}

/// One authenticated renderer connection.
pub struct WsWindow {
    label: String,
    peer: SocketAddr,
    outbound: mpsc::UnboundedSender<Outbound>,
    close_gate: Arc<CloseGate>,
    state: watch::Sender<WindowState>,
}

impl WsWindow {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> WindowState {
        *self.state.borrow()
    }

    fn mark_closed(&self) {
        if self.state() != WindowState::Closed {
            self.state.send_replace(WindowState::Closed);
        }
    }
}

impl WindowHandle for WsWindow {
    fn label(&self) -> &str {
        &self.label
    }

    fn send(&self, channel: &str, payload: Payload) {
        if self.state() == WindowState::Closed {
            debug!("Dropping broadcast on '{channel}': {} disconnected", self.peer);
            return;
        }
        let frame = WireFrame::Broadcast {
            channel: channel.to_string(),
            payload,
        };
        match frame.encode() {
            Ok(text) => {
                if self.outbound.send(Outbound::Frame(text)).is_err() {
                    debug!("Broadcast on '{channel}' lost: writer for {} gone", self.peer);
                }
            }
            Err(e) => error!("Failed to encode broadcast on '{channel}': {e}"),
        }
    }

    fn close(&self) {
        self.close_gate.request();
        self.mark_closed();
    }

    fn subscribe(&self) -> watch::Receiver<WindowState> {
        self.state.subscribe()
    }
}

/// Handle to a running WebSocket host. Dropping it stops accepting new
/// connections; established ones keep running.
pub struct WsServerHandle {
    local_addr: SocketAddr,
    windows: mpsc::UnboundedReceiver<Arc<WsWindow>>,
    accept_task: JoinHandle<()>,
}

impl WsServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    /// Next renderer that completed the hello handshake.
    pub async fn next_window(&mut self) -> Option<Arc<WsWindow>> {
        self.windows.recv().await
    }
}

impl Drop for WsServerHandle {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Start the WebSocket host on `address` (port 0 picks a free port).
///
/// # Errors
///
/// - [`TransportError::Auth`] if `address` is not a loopback address
/// - [`TransportError::Io`] if the port cannot be bound
pub async fn start_ws_host(
    address: SocketAddr,
    auth_token: AuthToken,
) -> Result<(Arc<WsHostTransport>, WsServerHandle), TransportError> {
    if !address.ip().is_loopback() {
        return Err(TransportError::Auth {
            message: format!("Refusing to bind non-loopback address {address}"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let listener = TcpListener::bind(address).await?;
    let local_addr = listener.local_addr()?;
    info!("IPC host listening on {local_addr}");

    let transport = Arc::new(WsHostTransport::default());
    let handlers = Arc::clone(&transport.handlers);
    let (windows_tx, windows_rx) = mpsc::unbounded_channel();

    let accept_task = TokioSpawn(async move {
        while let Ok((stream, addr)) = listener.accept().await {
            info!("Renderer connecting from {addr}");
            let token = auth_token.clone();
            let handlers = Arc::clone(&handlers);
            let windows = windows_tx.clone();
            TokioSpawn(async move {
                if let Err(e) = handle_connection(stream, addr, token, handlers, windows).await {
                    warn!("Connection from {addr} ended with error: {e}");
                }
            });
        }
    });

    Ok((
        transport,
        WsServerHandle {
            local_addr,
            windows: windows_rx,
            accept_task,
        },
    ))
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    auth_token: AuthToken,
    handlers: Arc<HandlerTable>,
    windows: mpsc::UnboundedSender<Arc<WsWindow>>,
) -> Result<(), TransportError> {
    // SECURITY: Reject non-loopback connections
    if !addr.ip().is_loopback() {
        warn!("Rejected non-loopback connection from {addr}");
        return Ok(());
    }

    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| TransportError::Handshake {
            message: format!("WebSocket handshake failed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let (mut write, mut read) = ws_stream.split();
    let mut state = ConnectionState::new(auth_token);

    // SECURITY: First frame MUST be hello
    let label = match read.next().await {
        Some(Ok(Message::Text(text))) => match WireFrame::decode(text.as_str()) {
            Ok(WireFrame::Hello { token, window }) => {
                if state.validate_token(&token) {
                    info!("Renderer {addr} authenticated for window type '{window}'");
                    send_frame(&mut write, &WireFrame::HelloResult { success: true, error: None })
                        .await?;
                    window
                } else {
                    warn!("Renderer {addr} auth failed: invalid token");
                    send_frame(
                        &mut write,
                        &WireFrame::HelloResult {
                            success: false,
                            error: Some(String::from("Invalid authentication token")),
                        },
                    )
                    .await?;
                    return Ok(());
                }
            }
            Ok(other) => {
                warn!("Renderer {addr} auth failed: first frame was '{}'", other.kind());
                return Ok(());
            }
            Err(e) => {
                warn!("Renderer {addr} sent an invalid first frame: {e}");
                return Ok(());
            }
        },
        Some(Ok(_)) => {
            warn!("Renderer {addr} sent non-text first message");
            return Ok(());
        }
        Some(Err(e)) => {
            return Err(TransportError::Disconnected {
                message: format!("Error reading first message from {addr}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        None => {
            warn!("Renderer {addr} disconnected before hello");
            return Ok(());
        }
    };

    if !state.is_authenticated() {
        return Ok(());
    }

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();
    let writer = TokioSpawn(async move {
        while let Some(outbound) = outbound_rx.recv().await {
            match outbound {
                Outbound::Frame(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        debug!("Write to {addr} failed: {e}");
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = write.close().await;
                    break;
                }
            }
        }
    });

    let close_gate = Arc::new(CloseGate::new(outbound_tx.clone()));
    let (state_tx, _) = watch::channel(WindowState::Loaded { generation: 1 });
    let window = Arc::new(WsWindow {
        label,
        peer: addr,
        outbound: outbound_tx.clone(),
        close_gate: Arc::clone(&close_gate),
        state: state_tx,
    });
    if windows.send(Arc::clone(&window)).is_err() {
        warn!("No one is accepting windows, closing {addr}");
        window.close();
    }

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => match WireFrame::decode(text.as_str()) {
                Ok(WireFrame::Invoke {
                    id,
                    channel,
                    payload,
                }) => {
                    let handlers = Arc::clone(&handlers);
                    let outbound = outbound_tx.clone();
                    let in_flight = close_gate.enter();
                    TokioSpawn(async move {
                        let reply = match handlers.dispatch(&channel, payload).await {
                            Ok(payload) => WireFrame::Reply {
                                id,
                                payload,
                                error: None,
                            },
                            Err(e) => {
                                debug!("Invoke of '{channel}' rejected: {e}");
                                WireFrame::Reply {
                                    id,
                                    payload: Value::Null,
                                    error: Some(e.to_string()),
                                }
                            }
                        };
                        match reply.encode() {
                            Ok(text) => {
                                let _ = outbound.send(Outbound::Frame(text));
                            }
                            Err(e) => error!("Failed to encode reply {id}: {e}"),
                        }
                        drop(in_flight);
                    });
                }
                Ok(other) => warn!("Renderer {addr} sent unexpected '{}' frame", other.kind()),
                Err(e) => warn!("Renderer {addr} sent an invalid frame: {e}"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => trace!("Ignoring non-text message from {addr}"),
            Err(e) => {
                debug!("Error reading from {addr}: {e}");
                break;
            }
        }
    }

    info!("Renderer {addr} ('{}') disconnected", window.label());
    window.mark_closed();
    let _ = outbound_tx.send(Outbound::Close);
    let _ = writer.await;
    Ok(())
}

async fn send_frame(write: &mut WsSink, frame: &WireFrame) -> Result<(), TransportError> {
    let text = frame.encode()?;
    write
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| TransportError::Disconnected {
            message: format!("Failed to send '{}' frame: {e}", frame.kind()),
            location: ErrorLocation::from(Location::caller()),
        })
}
