use crate::helpers::{
    DEMO_WINDOW, DemoWindow, Greet, GreetParams, TEST_AUTH_TOKEN, demo_registry, eventually,
};

use window_ipc::bridge::WindowManager;
use window_ipc::error::{ClientError, TransportError};
use window_ipc::transport::ws::{WsRendererTransport, start_ws_host};
use window_ipc::{IpcClient, WindowControllerBuilder, WindowState};

use common::AuthToken;

use std::net::SocketAddr;
use std::time::Duration;

// ============================================================================
// Host and page in separate tasks, talking over a loopback WebSocket
// ============================================================================

fn loopback() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

/// **VALUE**: Verifies an authenticated renderer gets a window, a handshake and answers.
///
/// **WHY THIS MATTERS**: This is the out-of-process deployment: host and page only share
/// the socket.
///
/// **BUG THIS CATCHES**: Would catch broadcasts or replies not being framed, or the host
/// never surfacing the connection as a window.
#[tokio::test]
async fn given_authenticated_renderer_when_invoking_then_host_answers() {
    // GIVEN: A host on a free loopback port
    let token = AuthToken::new(TEST_AUTH_TOKEN);
    let (transport, mut server) = start_ws_host(loopback(), token.clone()).await.unwrap();
    let registry = demo_registry();

    // WHEN: A renderer connects and the host builds a controller for it
    let renderer = WsRendererTransport::connect(&server.url(), &token, DEMO_WINDOW)
        .await
        .unwrap();
    let manager = WindowManager::new(renderer.clone());
    let window = server.next_window().await.unwrap();
    let controller = WindowControllerBuilder::new(DEMO_WINDOW)
        .with_handshake_interval(Duration::from_millis(20))
        .build(&registry, window, transport.clone());

    // THEN: The page learns its id over the socket and can call methods
    let data = tokio::time::timeout(Duration::from_secs(2), manager.ready())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&data.window_id, controller.window_id());
    assert!(eventually(|| controller.is_acknowledged()).await);

    let client = IpcClient::<DemoWindow>::new(data.window_id.clone(), renderer.clone());
    let greeting = client
        .invoke::<Greet>(GreetParams {
            name: Some(String::from("socket")),
        })
        .await
        .unwrap();
    assert_eq!(greeting, "hello socket");
}

/// **VALUE**: Verifies a wrong token is refused during hello.
///
/// **WHY THIS MATTERS**: Any local process can reach a loopback port; the token is what
/// keeps them from calling window methods.
///
/// **BUG THIS CATCHES**: Would catch token validation being skipped.
#[tokio::test]
async fn given_wrong_token_when_connecting_then_auth_error() {
    // GIVEN
    let (_transport, server) = start_ws_host(loopback(), AuthToken::new(TEST_AUTH_TOKEN))
        .await
        .unwrap();

    // WHEN
    let result =
        WsRendererTransport::connect(&server.url(), &AuthToken::new("wrong-token"), DEMO_WINDOW)
            .await;

    // THEN
    assert!(matches!(result, Err(TransportError::Auth { .. })));
}

/// **VALUE**: Verifies the host refuses to bind beyond loopback.
///
/// **BUG THIS CATCHES**: Would catch the IPC port being exposed on the network.
#[tokio::test]
async fn given_non_loopback_address_when_starting_host_then_refused() {
    let address = SocketAddr::from(([0, 0, 0, 0], 0));
    let result = start_ws_host(address, AuthToken::generate()).await;
    assert!(matches!(result, Err(TransportError::Auth { .. })));
}

/// **VALUE**: Verifies a dropped connection counts as a closed window and tears down.
///
/// **WHY THIS MATTERS**: A crashed page never calls close; its channels must still be freed.
///
/// **BUG THIS CATCHES**: Would catch handlers leaking after a renderer disconnects.
#[tokio::test]
async fn given_connected_renderer_when_it_disconnects_then_controller_torn_down() {
    // GIVEN
    let token = AuthToken::new(TEST_AUTH_TOKEN);
    let (transport, mut server) = start_ws_host(loopback(), token.clone()).await.unwrap();
    let registry = demo_registry();
    let renderer = WsRendererTransport::connect(&server.url(), &token, DEMO_WINDOW)
        .await
        .unwrap();
    let window = server.next_window().await.unwrap();
    let controller =
        WindowControllerBuilder::new(DEMO_WINDOW).build(&registry, window.clone(), transport.clone());
    assert!(transport.handler_count() > 0);

    // WHEN
    renderer.disconnect();

    // THEN
    assert!(eventually(|| window.state() == WindowState::Closed).await);
    assert!(eventually(|| controller.is_torn_down()).await);
    assert_eq!(transport.handler_count(), 0);
    assert!(eventually(|| !renderer.is_connected()).await);

    let client = IpcClient::<DemoWindow>::new(controller.window_id().clone(), renderer.clone());
    let after = client.invoke::<Greet>(GreetParams::default()).await;
    assert!(matches!(after, Err(ClientError::Transport { .. })));
}

/// **VALUE**: Verifies closing a window over the socket answers before the socket closes.
///
/// **WHY THIS MATTERS**: A transport error means the channel itself is broken; a close the
/// host carried out must read as success on the page.
///
/// **BUG THIS CATCHES**: Would catch the socket being shut before the close reply is
/// written, failing every closeWindow with Disconnected.
#[tokio::test]
async fn given_connected_renderer_when_close_window_then_ok_and_window_torn_down() {
    // GIVEN: A renderer whose controller completed the handshake
    let token = AuthToken::new(TEST_AUTH_TOKEN);
    let (transport, mut server) = start_ws_host(loopback(), token.clone()).await.unwrap();
    let registry = demo_registry();
    let renderer = WsRendererTransport::connect(&server.url(), &token, DEMO_WINDOW)
        .await
        .unwrap();
    let manager = WindowManager::new(renderer.clone());
    let window = server.next_window().await.unwrap();
    let controller = WindowControllerBuilder::new(DEMO_WINDOW)
        .with_handshake_interval(Duration::from_millis(20))
        .build(&registry, window.clone(), transport.clone());
    tokio::time::timeout(Duration::from_secs(2), manager.ready())
        .await
        .unwrap()
        .unwrap();

    // WHEN: The page asks the host to close it
    let result = manager.close_window().await;

    // THEN: Success, and the host side is gone
    assert!(result.is_ok(), "close_window failed: {result:?}");
    assert!(eventually(|| window.state() == WindowState::Closed).await);
    assert!(eventually(|| controller.is_torn_down()).await);
    assert_eq!(transport.handler_count(), 0);
    assert!(eventually(|| !renderer.is_connected()).await);
}

/// **VALUE**: Verifies connect_with_retry gives up within its budget when nothing listens.
///
/// **BUG THIS CATCHES**: Would catch an unbounded retry loop hanging startup.
#[tokio::test]
async fn given_no_host_when_connecting_with_retry_then_gives_up() {
    // GIVEN: A port that was bound and released
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    // WHEN
    let result = WsRendererTransport::connect_with_retry(
        &url,
        &AuthToken::new(TEST_AUTH_TOKEN),
        DEMO_WINDOW,
        Duration::from_millis(300),
    )
    .await;

    // THEN
    assert!(matches!(result, Err(TransportError::Handshake { .. })));
}

/// **VALUE**: Verifies a non-ws URL is rejected before any connection attempt.
///
/// **BUG THIS CATCHES**: Would catch retries being spent on a URL that can never work.
#[tokio::test]
async fn given_http_url_when_connecting_with_retry_then_invalid_url_immediately() {
    let result = WsRendererTransport::connect_with_retry(
        "http://127.0.0.1:1",
        &AuthToken::new(TEST_AUTH_TOKEN),
        DEMO_WINDOW,
        Duration::from_secs(30),
    )
    .await;
    assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
}
