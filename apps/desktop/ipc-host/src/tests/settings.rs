use crate::error::HostError;
use crate::settings::{
    CONNECTION_FILE_NAME, ConnectionInfo, HANDSHAKE_INTERVAL_ENV, PORT_ENV, apply_env_overrides,
    load_config,
};

use window_ipc::IpcConfig;

use common::AuthToken;

use std::collections::HashMap;

use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

/// **VALUE**: Verifies environment variables override the file values.
///
/// **WHY THIS MATTERS**: Running two hosts side by side needs a port override without
/// editing `ipc.json`.
///
/// **BUG THIS CATCHES**: Would catch an override read but never applied.
#[test]
fn given_env_overrides_when_applied_then_config_updated() {
    // GIVEN
    let mut config = IpcConfig::default();

    // WHEN
    apply_env_overrides(
        &mut config,
        env(&[(PORT_ENV, "20001"), (HANDSHAKE_INTERVAL_ENV, " 150 ")]),
    )
    .unwrap();

    // THEN
    assert_eq!(config.transport.port, 20001);
    assert_eq!(config.handshake.interval_ms, 150);
}

/// **VALUE**: Verifies a malformed override fails startup instead of being ignored.
///
/// **BUG THIS CATCHES**: Would catch `WINDOW_IPC_PORT=abc` silently falling back to the
/// default port.
#[test]
fn given_non_numeric_override_when_applied_then_config_error() {
    // GIVEN
    let mut config = IpcConfig::default();

    // WHEN
    let result = apply_env_overrides(&mut config, env(&[(PORT_ENV, "abc")]));

    // THEN
    assert!(matches!(result, Err(HostError::Config { .. })));
    assert_eq!(config.transport.port, IpcConfig::default().transport.port);
}

/// **VALUE**: Verifies no overrides leaves the loaded config untouched.
///
/// **BUG THIS CATCHES**: Would catch defaults being re-applied over file values.
#[test]
fn given_no_overrides_when_applied_then_config_unchanged() {
    let mut config = IpcConfig::default();
    config.handshake.interval_ms = 900;
    apply_env_overrides(&mut config, env(&[])).unwrap();
    assert_eq!(config.handshake.interval_ms, 900);
}

/// **VALUE**: Verifies an invalid `ipc.json` stops startup.
///
/// **BUG THIS CATCHES**: Would catch load_config swallowing validation errors.
#[test]
fn given_invalid_config_file_when_loading_then_config_error() {
    // GIVEN
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("ipc.json"),
        r#"{"transport": {"host": "192.168.1.10"}}"#,
    )
    .unwrap();

    // WHEN
    let result = load_config(temp_dir.path());

    // THEN
    assert!(matches!(result, Err(HostError::Config { .. })));
}

/// **VALUE**: Verifies the connection file round-trips url and token.
///
/// **WHY THIS MATTERS**: This file is how a presentation process finds and authenticates
/// with the host.
///
/// **BUG THIS CATCHES**: Would catch the token being written redacted or not at all.
#[test]
fn given_connection_info_when_saved_and_loaded_then_token_matches() {
    // GIVEN
    let temp_dir = TempDir::new().unwrap();
    let token = AuthToken::generate();
    let info = ConnectionInfo::new("ws://127.0.0.1:19876", &token);

    // WHEN
    info.save(temp_dir.path()).unwrap();
    let loaded = ConnectionInfo::load(temp_dir.path()).unwrap();

    // THEN
    assert_eq!(loaded, info);
    assert!(loaded.token() == token);

    // WHEN: Removed, twice
    ConnectionInfo::remove(temp_dir.path());
    ConnectionInfo::remove(temp_dir.path());

    // THEN
    assert!(!temp_dir.path().join(CONNECTION_FILE_NAME).exists());
    assert!(ConnectionInfo::load(temp_dir.path()).is_err());
}
