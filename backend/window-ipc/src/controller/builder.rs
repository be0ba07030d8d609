use crate::config::IpcConfig;
use crate::controller::handshake::Handshake;
use crate::controller::response_wait::PendingResponses;
use crate::controller::{ControllerInner, WindowController};
use crate::error::controller::ControllerError;
use crate::registry::HandlerRegistry;
use crate::transport::{HostTransport, WindowHandle};

use common::window_id::WINDOW_ID_LENGTH;
use common::{ErrorLocation, WindowId};

use std::collections::BTreeMap;
use std::panic::Location;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};

pub const DEFAULT_HANDSHAKE_INTERVAL: Duration = Duration::from_millis(2000);

/// Builder for [`WindowController`].
#[derive(Debug, Clone)]
pub struct WindowControllerBuilder {
    window_type: String,
    data: Map<String, Value>,
    window_id: Option<WindowId>,
    window_id_length: usize,
    handshake_interval: Duration,
    response_timeout: Option<Duration>,
}

impl WindowControllerBuilder {
    pub fn new(window_type: impl Into<String>) -> Self {
        Self {
            window_type: window_type.into(),
            data: Map::new(),
            window_id: None,
            window_id_length: WINDOW_ID_LENGTH,
            handshake_interval: DEFAULT_HANDSHAKE_INTERVAL,
            response_timeout: None,
        }
    }

    /// Initial data pushed to the page; `windowId` is added on top.
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Like [`WindowControllerBuilder::with_data`] for any JSON value.
    ///
    /// # Errors
    ///
    /// [`ControllerError::InvalidInitialData`] unless `data` is an object.
    #[track_caller]
    pub fn with_json_data(self, data: Value) -> Result<Self, ControllerError> {
        match data {
            Value::Object(map) => Ok(self.with_data(map)),
            Value::Null => Ok(self),
            other => Err(ControllerError::InvalidInitialData {
                message: format!("initial data must be a JSON object, got {other}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    pub fn with_config(mut self, config: &IpcConfig) -> Self {
        self.window_id_length = config.window_id_length;
        self.handshake_interval = config.handshake_interval();
        self.response_timeout = config.response_timeout();
        self
    }

    pub fn with_window_id(mut self, window_id: WindowId) -> Self {
        self.window_id = Some(window_id);
        self
    }

    pub fn with_handshake_interval(mut self, interval: Duration) -> Self {
        self.handshake_interval = interval;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Install the window's handlers and start following its lifecycle.
    pub fn build(
        self,
        registry: &HandlerRegistry,
        window: Arc<dyn WindowHandle>,
        transport: Arc<dyn HostTransport>,
    ) -> WindowController {
        let window_id = self
            .window_id
            .unwrap_or_else(|| WindowId::generate_with_length(self.window_id_length));

        let inner = ControllerInner {
            window_id,
            window_type: Arc::from(self.window_type),
            window,
            transport,
            data: self.data,
            response_timeout: self.response_timeout,
            channels: Mutex::new(BTreeMap::new()),
            pending_responses: Arc::new(PendingResponses::default()),
            handshake: Handshake::new(self.handshake_interval),
            torn_down: AtomicBool::new(false),
        };

        WindowController::start(inner, registry)
    }
}
