use ipc_host::host::{emit_contract, serve, start};
use ipc_host::settings::ConnectionInfo;
use ipc_host::state::HostState;
use ipc_host::windows::{ExampleWindow, Greet, GreetParams, build_registry};

use window_ipc::bridge::WindowManager;
use window_ipc::transport::ws::WsRendererTransport;
use window_ipc::{IpcClient, IpcConfig};

use common::{AuthToken, ContractManifest, WindowType};

use std::time::Duration;

use tempfile::TempDir;

// ============================================================================
// The host loop end to end: config -> registry -> WebSocket -> tracked window
// ============================================================================

fn test_config() -> IpcConfig {
    let mut config = IpcConfig::default();
    config.transport.port = 0;
    config.handshake.interval_ms = 20;
    config
}

async fn eventually_count(state: &HostState, expected: usize) -> bool {
    for _ in 0..200 {
        if state.window_count().await == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// **VALUE**: Verifies a renderer reading the connection file can open a window and call it.
///
/// **WHY THIS MATTERS**: This is the production startup path minus the signal handling.
///
/// **BUG THIS CATCHES**: Would catch the host binding somewhere other than the URL it
/// publishes, or never tracking accepted windows.
#[tokio::test]
async fn given_running_host_when_renderer_connects_then_window_tracked_and_callable() {
    // GIVEN: A host on a free port with its connection file written
    let config = test_config();
    let registry = build_registry(&config).unwrap();
    let token = AuthToken::generate();
    let (transport, server) = start(&config, token.clone()).await.unwrap();
    let config_dir = TempDir::new().unwrap();
    ConnectionInfo::new(server.url(), &token)
        .save(config_dir.path())
        .unwrap();

    let state = HostState::new();
    let serve_task = tokio::spawn(serve(server, transport, registry, config, state.clone()));

    // WHEN: A renderer connects using only the connection file
    let info = ConnectionInfo::load(config_dir.path()).unwrap();
    let renderer = WsRendererTransport::connect(&info.url, &info.token(), ExampleWindow::NAME)
        .await
        .unwrap();
    let manager = WindowManager::new(renderer.clone());
    let data = tokio::time::timeout(Duration::from_secs(2), manager.ready())
        .await
        .unwrap()
        .unwrap();

    // THEN: Tracked, and greet answers
    assert!(eventually_count(&state, 1).await);
    assert_eq!(state.windows().await[0].window_id, data.window_id);

    let client = IpcClient::<ExampleWindow>::new(data.window_id.clone(), renderer.clone());
    let greeting = client
        .invoke::<Greet>(GreetParams {
            name: Some(String::from("host")),
        })
        .await
        .unwrap();
    assert_eq!(greeting, "hello host");

    // WHEN: The page closes its window
    client.close_window().await.unwrap();

    // THEN: Unregistered
    assert!(eventually_count(&state, 0).await);
    serve_task.abort();
}

/// **VALUE**: Verifies renderers announcing an undeclared window type are turned away.
///
/// **BUG THIS CATCHES**: Would catch the host building an empty controller for a type it
/// has no contract for.
#[tokio::test]
async fn given_unknown_window_type_when_renderer_connects_then_closed_and_not_tracked() {
    // GIVEN
    let config = test_config();
    let registry = build_registry(&config).unwrap();
    let token = AuthToken::generate();
    let (transport, server) = start(&config, token.clone()).await.unwrap();
    let url = server.url();
    let state = HostState::new();
    let serve_task = tokio::spawn(serve(server, transport, registry, config, state.clone()));

    // WHEN
    let renderer = WsRendererTransport::connect(&url, &token, "mysteryWindow")
        .await
        .unwrap();

    // THEN
    let mut disconnected = false;
    for _ in 0..200 {
        if !renderer.is_connected() {
            disconnected = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(disconnected, "host should close an unknown window type");
    assert_eq!(state.window_count().await, 0);
    serve_task.abort();
}

/// **VALUE**: Verifies the emitted contract parses back and lists every method.
///
/// **WHY THIS MATTERS**: The presentation build checks its allow-lists against this file.
///
/// **BUG THIS CATCHES**: Would catch the manifest losing the renderer-ack flag or a window.
#[test]
fn given_registry_when_emitting_contract_then_manifest_file_round_trips() {
    // GIVEN
    let registry = build_registry(&IpcConfig::default()).unwrap();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("generated").join("contract.json");

    // WHEN
    emit_contract(&registry, &path).unwrap();

    // THEN
    let manifest = ContractManifest::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(manifest, registry.manifest());
    assert_eq!(
        manifest.window_types().collect::<Vec<_>>(),
        vec!["exampleWindow", "settingsWindow"]
    );
    assert!(
        manifest
            .declaration("exampleWindow", "pickColor")
            .unwrap()
            .needs_renderer_ack
    );
}
