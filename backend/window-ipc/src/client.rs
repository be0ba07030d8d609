//! Presentation-side proxy for one window's scoped channels.

use crate::error::client::ClientError;
use crate::transport::{Payload, RendererTransport};

use common::channel::{close_channel, response_channel, scoped_name};
use common::{ErrorLocation, ResponseEnvelope, WindowId, WindowMethod, WindowType};

use std::fmt;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::Arc;

use log::debug;
use serde_json::Value;

/// Untyped proxy: JSON params in, unwrapped envelope data out.
#[derive(Clone)]
pub struct RawClient {
    window_id: WindowId,
    window_name: String,
    transport: Arc<dyn RendererTransport>,
}

impl RawClient {
    pub fn new(
        window_id: WindowId,
        window_name: impl Into<String>,
        transport: Arc<dyn RendererTransport>,
    ) -> Self {
        Self {
            window_id,
            window_name: window_name.into(),
            transport,
        }
    }

    pub fn window_id(&self) -> &WindowId {
        &self.window_id
    }

    pub fn window_name(&self) -> &str {
        &self.window_name
    }

    /// Call `method` and unwrap its envelope.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Remote`] when the handler answered `success: false`
    /// - [`ClientError::Transport`] when the call never reached a handler
    /// - [`ClientError::Decode`] when the reply is not an envelope
    pub async fn invoke(&self, method: &str, params: Payload) -> Result<Payload, ClientError> {
        let channel = scoped_name(&self.window_id, method);
        debug!("Invoking '{channel}' on window '{}'", self.window_name);

        let reply = self.transport.invoke(&channel, params).await?;

        let envelope: ResponseEnvelope =
            serde_json::from_value(reply).map_err(|e| ClientError::Decode {
                message: format!("Malformed response envelope from '{channel}': {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        envelope
            .into_result()
            .map(|data| data.unwrap_or(Value::Null))
            .map_err(|message| ClientError::Remote {
                message,
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Complete a pending request of a renderer-ack method with `payload`.
    pub async fn respond(&self, method: &str, payload: Payload) -> Result<(), ClientError> {
        let channel = response_channel(&self.window_id, method);
        debug!("Responding on '{channel}'");
        self.transport.invoke(&channel, payload).await?;
        Ok(())
    }

    pub async fn close_window(&self) -> Result<(), ClientError> {
        self.transport
            .invoke(&close_channel(&self.window_id), Value::Null)
            .await?;
        Ok(())
    }
}

impl fmt::Debug for RawClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawClient")
            .field("window_id", &self.window_id)
            .field("window_name", &self.window_name)
            .finish_non_exhaustive()
    }
}

/// Typed proxy for window type `W`. Only methods declared for `W` can be
/// called, with exactly their declared params and return types.
pub struct IpcClient<W: WindowType> {
    raw: RawClient,
    _window: PhantomData<fn() -> W>,
}

impl<W: WindowType> IpcClient<W> {
    pub fn new(window_id: WindowId, transport: Arc<dyn RendererTransport>) -> Self {
        Self {
            raw: RawClient::new(window_id, W::NAME, transport),
            _window: PhantomData,
        }
    }

    pub async fn invoke<M>(&self, params: M::Params) -> Result<M::Returns, ClientError>
    where
        M: WindowMethod<Window = W>,
    {
        let params = serde_json::to_value(params).map_err(|e| ClientError::Encode {
            message: format!("Failed to encode params of '{}': {e}", M::NAME),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let data = self.raw.invoke(M::NAME, params).await?;

        serde_json::from_value(data).map_err(|e| ClientError::Decode {
            message: format!("Unexpected result from '{}': {e}", M::NAME),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    pub async fn respond<M>(&self, payload: M::Returns) -> Result<(), ClientError>
    where
        M: WindowMethod<Window = W>,
    {
        let payload = serde_json::to_value(payload).map_err(|e| ClientError::Encode {
            message: format!("Failed to encode response of '{}': {e}", M::NAME),
            location: ErrorLocation::from(Location::caller()),
        })?;
        self.raw.respond(M::NAME, payload).await
    }

    pub async fn close_window(&self) -> Result<(), ClientError> {
        self.raw.close_window().await
    }

    pub fn window_id(&self) -> &WindowId {
        self.raw.window_id()
    }

    pub fn raw(&self) -> &RawClient {
        &self.raw
    }
}

impl<W: WindowType> Clone for IpcClient<W> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _window: PhantomData,
        }
    }
}
