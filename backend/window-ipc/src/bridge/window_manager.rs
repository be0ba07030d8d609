//! The fixed window manager global and the bootstrap that publishes the
//! application API once the window knows its id.

use crate::bridge::ExposedApi;
use crate::client::RawClient;
use crate::error::bridge::BridgeError;
use crate::error::client::ClientError;
use crate::transport::{MainWorld, RendererTransport};

use common::channel::{DATA_CHANNEL, ack_channel};
use common::{ErrorLocation, WindowId};

use std::panic::Location;
use std::sync::{Arc, Weak};

use log::{debug, info, warn};
use serde_json::{Map, Value};
use tokio::sync::{oneshot, watch};

pub const WINDOW_MANAGER_GLOBAL: &str = "ipcWindowManager";
pub const DEFAULT_SCOPE_NAME: &str = "ipc";

const WINDOW_ID_KEY: &str = "windowId";

/// Initial data captured from the host's handshake broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowData {
    pub window_id: WindowId,
    /// The application payload; `windowId` is split off into `window_id`.
    pub data: Map<String, Value>,
}

impl WindowData {
    fn from_payload(payload: Value) -> Option<Self> {
        let Value::Object(mut data) = payload else {
            return None;
        };
        let window_id = match data.remove(WINDOW_ID_KEY) {
            Some(Value::String(id)) if !id.is_empty() => WindowId::from(id),
            _ => return None,
        };
        Some(Self { window_id, data })
    }
}

/// Captures the window id from the first well-formed `window:data`
/// broadcast, acknowledges it and serves every later call from that value.
pub struct WindowManager {
    transport: Arc<dyn RendererTransport>,
    data: watch::Sender<Option<Arc<WindowData>>>,
}

impl WindowManager {
    /// Start listening for the handshake. Must run inside a Tokio runtime;
    /// the acknowledgement is sent from a spawned task.
    pub fn new(transport: Arc<dyn RendererTransport>) -> Arc<Self> {
        let (data, _) = watch::channel(None);
        let manager = Arc::new(Self { transport, data });
        Self::listen(&manager);
        manager
    }

    fn listen(manager: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(manager);
        manager.transport.once(
            DATA_CHANNEL,
            Box::new(move |payload| {
                if let Some(manager) = weak.upgrade() {
                    manager.receive(payload);
                }
            }),
        );
    }

    fn receive(self: Arc<Self>, payload: Value) {
        if self.data.borrow().is_some() {
            return;
        }

        let Some(window_data) = WindowData::from_payload(payload) else {
            warn!("Ignoring '{DATA_CHANNEL}' broadcast without a windowId");
            Self::listen(&self);
            return;
        };

        let window_id = window_data.window_id.clone();
        info!("Window id {window_id} received, acknowledging");
        self.data.send_replace(Some(Arc::new(window_data)));

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let channel = ack_channel(&window_id);
            if let Err(e) = transport.invoke(&channel, Value::Null).await {
                warn!("Failed to acknowledge initial data on '{channel}': {e}");
            }
        });
    }

    pub fn is_ready(&self) -> bool {
        self.data.borrow().is_some()
    }

    pub fn window_id(&self) -> Option<WindowId> {
        self.data
            .borrow()
            .as_ref()
            .map(|window_data| window_data.window_id.clone())
    }

    /// Wait for the handshake. Every caller gets the same captured value.
    pub async fn ready(&self) -> Result<Arc<WindowData>, BridgeError> {
        let mut receiver = self.data.subscribe();
        let captured = receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|_| BridgeError::Disconnected {
                message: String::from("window manager dropped before initial data arrived"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        match captured.as_ref() {
            Some(window_data) => Ok(Arc::clone(window_data)),
            None => Err(BridgeError::Disconnected {
                message: String::from("initial data missing after handshake"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    pub async fn get_data(&self) -> Result<Map<String, Value>, BridgeError> {
        Ok(self.ready().await?.data.clone())
    }

    /// Run `callback` with the initial data once it has arrived.
    pub fn on_data<F>(self: &Arc<Self>, callback: F)
    where
        F: FnOnce(Map<String, Value>) + Send + 'static,
    {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            match manager.ready().await {
                Ok(window_data) => callback(window_data.data.clone()),
                Err(e) => debug!("Initial data never arrived: {e}"),
            }
        });
    }

    /// Ask the host to close this window.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotReady`] before the window id is known.
    pub async fn close_window(&self) -> Result<(), ClientError> {
        let Some(window_id) = self.window_id() else {
            return Err(ClientError::NotReady {
                message: String::from("closeWindow called before the window id is known"),
                location: ErrorLocation::from(Location::caller()),
            });
        };
        RawClient::new(window_id, "", Arc::clone(&self.transport))
            .close_window()
            .await
    }

    /// Publish `isReady`, `getData`, `onData` and `closeWindow` under
    /// [`WINDOW_MANAGER_GLOBAL`].
    ///
    /// `isReady` resolves with `null` once the handshake completed. Exposed
    /// functions take and return JSON, so `onData` cannot carry a callback:
    /// it registers through [`WindowManager::on_data`] and resolves with the
    /// data that callback receives.
    pub fn install(self: &Arc<Self>, world: &dyn MainWorld) -> Result<(), BridgeError> {
        let api = ExposedApi::new()
            .with("isReady", {
                let manager = Arc::clone(self);
                move |_| {
                    let manager = Arc::clone(&manager);
                    async move {
                        manager.ready().await.map_err(not_ready)?;
                        Ok::<Value, ClientError>(Value::Null)
                    }
                }
            })
            .with("getData", {
                let manager = Arc::clone(self);
                move |_| {
                    let manager = Arc::clone(&manager);
                    async move { manager.exposed_data().await }
                }
            })
            .with("onData", {
                let manager = Arc::clone(self);
                move |_| {
                    let (data_tx, data_rx) = oneshot::channel();
                    manager.on_data(move |data| {
                        let _ = data_tx.send(data);
                    });
                    async move {
                        data_rx.await.map(Value::Object).map_err(|_| ClientError::NotReady {
                            message: String::from("initial data never arrived"),
                            location: ErrorLocation::from(Location::caller()),
                        })
                    }
                }
            })
            .with("closeWindow", {
                let manager = Arc::clone(self);
                move |_| {
                    let manager = Arc::clone(&manager);
                    async move {
                        manager.close_window().await?;
                        Ok::<Value, ClientError>(Value::Null)
                    }
                }
            });

        world.expose_in_main_world(WINDOW_MANAGER_GLOBAL, api)
    }

    async fn exposed_data(&self) -> Result<Value, ClientError> {
        self.get_data().await.map(Value::Object).map_err(not_ready)
    }
}

#[track_caller]
fn not_ready(e: BridgeError) -> ClientError {
    ClientError::NotReady {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Install the window manager, wait for the handshake, then publish the
/// API `register` builds for this window under `scope` (default `"ipc"`).
pub async fn expose_window_api<F>(
    transport: Arc<dyn RendererTransport>,
    world: &dyn MainWorld,
    scope: Option<&str>,
    register: F,
) -> Result<Arc<WindowManager>, BridgeError>
where
    F: FnOnce(&WindowId) -> Result<ExposedApi, BridgeError>,
{
    let manager = WindowManager::new(transport);
    manager.install(world)?;

    let window_data = manager.ready().await?;
    let api = register(&window_data.window_id)?;

    let scope = scope.unwrap_or(DEFAULT_SCOPE_NAME);
    world.expose_in_main_world(scope, api)?;
    debug!("Window {} API exposed under '{scope}'", window_data.window_id);

    Ok(manager)
}
