use crate::helpers::{
    Confirm, Confirmation, DEMO_WINDOW, DemoWindow, Greet, GreetParams, demo_registry, eventually,
};

use window_ipc::bridge::{DEFAULT_SCOPE_NAME, GlobalScope, build_api, expose_window_api};
use window_ipc::error::ClientError;
use window_ipc::transport::LocalTransport;
use window_ipc::{IpcClient, WindowControllerBuilder};

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

// ============================================================================
// Full host <-> page round trips over the in-process transport
// ============================================================================

/// **VALUE**: Verifies the whole pipeline: deferred registration, controller install,
/// handshake, bridge bootstrap and a page call through the allow-listed global.
///
/// **WHY THIS MATTERS**: Every piece can pass its unit tests while the wiring between
/// them is broken; this is the path every real window takes.
///
/// **BUG THIS CATCHES**: Would catch mismatched channel naming between the controller and
/// the proxy, or a bridge that never sees the window id.
#[tokio::test]
async fn given_demo_window_when_page_bootstraps_and_calls_then_host_answers() {
    // GIVEN: A registry whose methods were registered before the type was declared
    let registry = demo_registry();
    let transport = Arc::new(LocalTransport::new());
    let (window, renderer) = transport.open_window(DEMO_WINDOW);
    let controller = WindowControllerBuilder::new(DEMO_WINDOW)
        .with_json_data(json!({"user": "ada"}))
        .unwrap()
        .with_handshake_interval(Duration::from_millis(20))
        .build(&registry, window.clone(), transport.clone());

    // WHEN: The page loads and bootstraps its bridge
    window.finish_load();
    let world = GlobalScope::new();
    let page_transport = renderer.clone();
    let manager = expose_window_api(renderer.clone(), &world, None, move |window_id| {
        build_api(page_transport, window_id, DEMO_WINDOW, &["greet"], None)
    })
    .await
    .unwrap();

    // THEN: Id and data match, host stops broadcasting, the API answers
    assert_eq!(manager.window_id().as_ref(), Some(controller.window_id()));
    let data = manager.get_data().await.unwrap();
    assert_eq!(data["user"], json!("ada"));
    assert!(eventually(|| controller.is_acknowledged()).await);
    assert!(!controller.is_broadcasting());

    let greeting = world
        .call(DEFAULT_SCOPE_NAME, "greet", json!({"name": "Ada"}))
        .await
        .unwrap();
    assert_eq!(greeting, json!("hello Ada"));
}

/// **VALUE**: Verifies handler failures reach the page as errors carrying the message.
///
/// **BUG THIS CATCHES**: Would catch failure envelopes being decoded as successful data.
#[tokio::test]
async fn given_failing_handler_when_page_invokes_then_remote_error_with_message() {
    // GIVEN
    let registry = demo_registry();
    let transport = Arc::new(LocalTransport::new());
    let (window, renderer) = transport.open_window(DEMO_WINDOW);
    let controller =
        WindowControllerBuilder::new(DEMO_WINDOW).build(&registry, window, transport.clone());
    let client = IpcClient::<DemoWindow>::new(controller.window_id().clone(), renderer);

    // WHEN
    let result = client
        .invoke::<Greet>(GreetParams {
            name: Some(String::new()),
        })
        .await;

    // THEN
    match result {
        Err(ClientError::Remote { message, .. }) => {
            assert_eq!(message, "name must not be empty");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

/// **VALUE**: Verifies a renderer-ack method resolves with what the page sent back.
///
/// **WHY THIS MATTERS**: Dialog-style flows depend on the page's answer, not the handler's.
///
/// **BUG THIS CATCHES**: Would catch the handler's own return value leaking through.
#[tokio::test]
async fn given_renderer_ack_method_when_page_responds_then_request_gets_response() {
    // GIVEN
    let registry = demo_registry();
    let transport = Arc::new(LocalTransport::new());
    let (window, renderer) = transport.open_window(DEMO_WINDOW);
    let controller =
        WindowControllerBuilder::new(DEMO_WINDOW).build(&registry, window, transport.clone());
    let client = IpcClient::<DemoWindow>::new(controller.window_id().clone(), renderer);

    // WHEN: Request in flight, then the page answers
    let caller = client.clone();
    let request = tokio::spawn(async move { caller.invoke::<Confirm>(()).await });
    assert!(eventually(|| controller.pending_response_count() == 1).await);
    client
        .respond::<Confirm>(Confirmation { confirmed: true })
        .await
        .unwrap();

    // THEN
    let answer = request.await.unwrap().unwrap();
    assert_eq!(answer, Confirmation { confirmed: true });
    assert_eq!(controller.pending_response_count(), 0);
}

/// **VALUE**: Verifies closing from the page tears the window down and frees its channels.
///
/// **BUG THIS CATCHES**: Would catch handlers surviving their window.
#[tokio::test]
async fn given_open_window_when_page_closes_then_handlers_gone() {
    // GIVEN
    let registry = demo_registry();
    let transport = Arc::new(LocalTransport::new());
    let (window, renderer) = transport.open_window(DEMO_WINDOW);
    let controller =
        WindowControllerBuilder::new(DEMO_WINDOW).build(&registry, window.clone(), transport.clone());
    let client = IpcClient::<DemoWindow>::new(controller.window_id().clone(), renderer);
    assert_eq!(transport.handler_count(), 3);

    // WHEN
    client.close_window().await.unwrap();

    // THEN
    assert!(eventually(|| controller.is_torn_down()).await);
    assert!(window.is_closed());
    assert_eq!(transport.handler_count(), 0);
    assert!(client.invoke::<Greet>(GreetParams::default()).await.is_err());
}
