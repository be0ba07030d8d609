//! Allow-list bridges: exactly the listed methods become page functions.

use crate::bridge::ExposedApi;
use crate::client::{IpcClient, RawClient};
use crate::error::bridge::BridgeError;
use crate::error::client::ClientError;
use crate::transport::{MainWorld, Payload, RendererTransport};

use common::channel::is_valid_method_name;
use common::{ContractManifest, ErrorLocation, WindowId, WindowMethod, WindowType};

use std::panic::Location;
use std::sync::Arc;

use log::debug;

/// Typed allow-list for window type `W`, published under `W::NAME`.
pub struct AllowListBridge<W: WindowType> {
    client: IpcClient<W>,
    api: ExposedApi,
}

impl<W: WindowType> AllowListBridge<W> {
    pub fn new(window_id: WindowId, transport: Arc<dyn RendererTransport>) -> Self {
        Self {
            client: IpcClient::new(window_id, transport),
            api: ExposedApi::new(),
        }
    }

    /// Make `M` callable from the page.
    pub fn allow<M>(mut self) -> Self
    where
        M: WindowMethod<Window = W>,
    {
        let client = self.client.clone();
        self.api.insert(M::NAME, move |payload: Payload| {
            let client = client.clone();
            async move {
                let params: M::Params =
                    serde_json::from_value(payload).map_err(|e| ClientError::Encode {
                        message: format!("Invalid params for '{}': {e}", M::NAME),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

                let returns = client.invoke::<M>(params).await?;

                serde_json::to_value(returns).map_err(|e| ClientError::Decode {
                    message: format!("Failed to encode result of '{}': {e}", M::NAME),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        });
        self
    }

    pub fn into_api(self) -> ExposedApi {
        self.api
    }

    pub fn expose(self, world: &dyn MainWorld) -> Result<(), BridgeError> {
        world.expose_in_main_world(W::NAME, self.api)
    }
}

/// Build an untyped allow-list API for `methods` of `window_name`.
///
/// # Errors
///
/// - [`BridgeError::InvalidMethodName`] for a name that cannot be a channel
/// - [`BridgeError::UndeclaredMethod`] when `manifest` is given and does not
///   declare the method for `window_name`
#[track_caller]
pub fn build_api(
    transport: Arc<dyn RendererTransport>,
    window_id: &WindowId,
    window_name: &str,
    methods: &[&str],
    manifest: Option<&ContractManifest>,
) -> Result<ExposedApi, BridgeError> {
    let client = RawClient::new(window_id.clone(), window_name, transport);
    let mut api = ExposedApi::new();

    for method in methods {
        if !is_valid_method_name(method) {
            return Err(BridgeError::InvalidMethodName {
                method: method.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if manifest.is_some_and(|manifest| !manifest.contains(window_name, method)) {
            return Err(BridgeError::UndeclaredMethod {
                window: window_name.to_string(),
                method: method.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let client = client.clone();
        let name = method.to_string();
        api.insert(*method, move |payload: Payload| {
            let client = client.clone();
            let name = name.clone();
            async move { client.invoke(&name, payload).await }
        });
    }

    debug!("Allow-list for '{window_name}': {methods:?}");
    Ok(api)
}

/// [`build_api`] published under `window_name`.
#[track_caller]
pub fn expose_methods(
    world: &dyn MainWorld,
    transport: Arc<dyn RendererTransport>,
    window_id: &WindowId,
    window_name: &str,
    methods: &[&str],
    manifest: Option<&ContractManifest>,
) -> Result<(), BridgeError> {
    let api = build_api(transport, window_id, window_name, methods, manifest)?;
    world.expose_in_main_world(window_name, api)
}
