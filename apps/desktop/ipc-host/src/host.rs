//! WebSocket host loop: every authenticated renderer becomes a tracked
//! window controller.

use crate::error::HostError;
use crate::state::HostState;

use window_ipc::transport::ws::{WsHostTransport, WsServerHandle, start_ws_host};
use window_ipc::{HandlerRegistry, IpcConfig, WindowControllerBuilder, WindowHandle};

use common::{AuthToken, ErrorLocation};

use std::net::SocketAddr;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::net::lookup_host;

/// Resolve the configured host and port to a loopback socket address.
pub async fn resolve_address(config: &IpcConfig) -> Result<SocketAddr, HostError> {
    let target = format!("{}:{}", config.transport.host, config.transport.port);

    let mut addresses = lookup_host(&target).await.map_err(|e| HostError::Transport {
        message: format!("Failed to resolve {target}: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    addresses
        .find(|address| address.ip().is_loopback())
        .ok_or_else(|| HostError::Transport {
            message: format!("{target} does not resolve to a loopback address"),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// Bind the WebSocket host described by `config`.
pub async fn start(
    config: &IpcConfig,
    auth_token: AuthToken,
) -> Result<(Arc<WsHostTransport>, WsServerHandle), HostError> {
    let address = resolve_address(config).await?;
    Ok(start_ws_host(address, auth_token).await?)
}

/// Build and track a controller for every renderer the server accepts.
/// Returns when the server stops handing out windows.
pub async fn serve(
    mut server: WsServerHandle,
    transport: Arc<WsHostTransport>,
    registry: HandlerRegistry,
    config: IpcConfig,
    state: HostState,
) -> Result<(), HostError> {
    info!("Serving windows on {}", server.url());

    while let Some(window) = server.next_window().await {
        let window_type = window.label().to_string();
        if !registry.is_declared(&window_type) {
            warn!(
                "Renderer {} announced unknown window type '{window_type}', closing",
                window.peer()
            );
            window.close();
            continue;
        }

        let controller = WindowControllerBuilder::new(window_type.as_str())
            .with_config(&config)
            .build(&registry, window, transport.clone());
        info!(
            "Window {} ({window_type}) opened with {} channel(s)",
            controller.window_id(),
            controller.channels().len()
        );

        if let Err(e) = state.track(controller).await {
            error!("Failed to track window: {e}");
            return Err(e);
        }
    }

    info!("IPC host stopped accepting windows");
    Ok(())
}

/// Write the registry's contract manifest as pretty JSON to `path`.
pub fn emit_contract(registry: &HandlerRegistry, path: &Path) -> Result<(), HostError> {
    let json = registry.manifest().to_json_pretty()?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| HostError::Host {
            message: format!("Failed to create {}: {e}", parent.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;
    }

    std::fs::write(path, json).map_err(|e| HostError::Host {
        message: format!("Failed to write contract to {}: {e}", path.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!("Contract manifest written to {}", path.display());
    Ok(())
}
