use ipc_host::error::HostError;
use ipc_host::logger::initialize as LoggerInitialize;
use ipc_host::settings::{ConnectionInfo, default_config_dir, default_log_dir, load_config};
use ipc_host::state::HostState;
use ipc_host::windows::build_registry;
use ipc_host::{cli, host};

use common::{AuthToken, ErrorLocation};

use std::fs::create_dir_all;
use std::panic::Location;

use log::{info, warn};
use tokio::signal::ctrl_c;

#[tokio::main]
async fn main() -> Result<(), HostError> {
    let args = cli::parse();

    let config_dir = args.config_dir.unwrap_or_else(default_config_dir);
    let log_dir = args.log_dir.unwrap_or_else(default_log_dir);

    create_dir_all(&log_dir).map_err(|e| HostError::Host {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("IPC host starting");

    // Environment overrides may come from .env in the working directory
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {path:?}");
    }

    info!("Config directory: {}", config_dir.display());
    info!("Log directory: {}", log_dir.display());

    let config = load_config(&config_dir)?;
    let registry = build_registry(&config)?;

    if let Some(path) = args.emit_contract {
        return host::emit_contract(&registry, &path);
    }

    let auth_token = AuthToken::generate();
    let (transport, server) = host::start(&config, auth_token.clone()).await?;

    ConnectionInfo::new(server.url(), &auth_token).save(&config_dir)?;

    let state = HostState::new();
    let result = tokio::select! {
        result = host::serve(server, transport, registry, config, state.clone()) => result,
        _ = ctrl_c() => {
            info!("Shutdown requested");
            Ok(())
        }
    };

    let open = state.window_count().await;
    if open > 0 {
        warn!("Exiting with {open} window(s) still open");
    }
    ConnectionInfo::remove(&config_dir);

    result
}
