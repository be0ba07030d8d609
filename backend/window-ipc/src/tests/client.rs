use crate::client::{IpcClient, RawClient};
use crate::error::client::ClientError;
use crate::tests::support::{
    ColorChoice, EXAMPLE_WINDOW, ExampleWindow, Greet, GreetParams, PickColor, open_example_window,
    wait_until,
};
use crate::transport::{HostTransport, LocalTransport, WindowState, request_handler};

use common::WindowId;
use common::channel::{response_channel, scoped_name};

use std::sync::Arc;

use serde_json::{Value, json};

/// **VALUE**: Verifies the typed proxy call returns the handler's value.
///
/// **WHY THIS MATTERS**: This is the everyday path of every presentation-side call.
///
/// **BUG THIS CATCHES**: Would catch channel naming drift between proxy and controller, or
/// envelope unwrapping bugs.
#[tokio::test]
async fn given_controller_and_proxy_when_greet_invoked_then_returns_hello() {
    // GIVEN: A controller and a proxy for the same window
    let harness = open_example_window();
    let client = IpcClient::<ExampleWindow>::new(
        harness.controller.window_id().clone(),
        harness.renderer.clone(),
    );

    // WHEN: Invoking greet with and without a name
    let anonymous = client.invoke::<Greet>(GreetParams::default()).await.unwrap();
    let named = client
        .invoke::<Greet>(GreetParams {
            name: Some(String::from("Ada")),
        })
        .await
        .unwrap();

    // THEN: The handler's values come back unwrapped
    assert_eq!(anonymous, "hello");
    assert_eq!(named, "hello Ada");
}

/// **VALUE**: Verifies a failure envelope becomes a Remote error carrying exactly the
/// handler's message.
///
/// **WHY THIS MATTERS**: Callers show this message to users.
///
/// **BUG THIS CATCHES**: Would catch remote failures being reported as transport failures
/// or decorated with locations.
#[tokio::test]
async fn given_failure_envelope_when_invoked_then_remote_error_with_message() {
    // GIVEN: A raw handler answering with a failure envelope
    let transport = Arc::new(LocalTransport::new());
    let (_, renderer) = transport.open_window(EXAMPLE_WINDOW);
    let id = WindowId::from("abcde");
    transport
        .handle(
            &scoped_name(&id, "explode"),
            request_handler(|_| async { json!({"success": false, "error": "boom"}) }),
        )
        .unwrap();
    let client = RawClient::new(id, EXAMPLE_WINDOW, renderer);

    // WHEN: Invoking it
    let error = client.invoke("explode", Value::Null).await.unwrap_err();

    // THEN: Remote error displaying "boom"
    assert!(error.is_remote());
    assert_eq!(error.to_string(), "boom");
}

/// **VALUE**: Verifies a failure envelope without a message surfaces as "Unknown error".
///
/// **WHY THIS MATTERS**: The caller always gets something readable.
///
/// **BUG THIS CATCHES**: Would catch an empty or "None" error message.
#[tokio::test]
async fn given_failure_envelope_without_error_when_invoked_then_unknown_error() {
    // GIVEN: A handler answering {success:false}
    let transport = Arc::new(LocalTransport::new());
    let (_, renderer) = transport.open_window(EXAMPLE_WINDOW);
    let id = WindowId::from("abcde");
    transport
        .handle(
            &scoped_name(&id, "vague"),
            request_handler(|_| async { json!({"success": false}) }),
        )
        .unwrap();
    let client = RawClient::new(id, EXAMPLE_WINDOW, renderer);

    // WHEN / THEN
    let error = client.invoke("vague", Value::Null).await.unwrap_err();
    assert_eq!(error.to_string(), "Unknown error");
}

/// **VALUE**: Verifies a call with no handler is a transport failure, distinct from a
/// handler failure.
///
/// **WHY THIS MATTERS**: "The channel is broken" and "my call failed" need different
/// handling.
///
/// **BUG THIS CATCHES**: Would catch missing handlers being reported as Remote errors.
#[tokio::test]
async fn given_no_handler_when_invoked_then_transport_error() {
    // GIVEN: A proxy for a window id nothing is registered for
    let transport = Arc::new(LocalTransport::new());
    let (_, renderer) = transport.open_window(EXAMPLE_WINDOW);
    let client = RawClient::new(WindowId::from("zzzzz"), EXAMPLE_WINDOW, renderer);

    // WHEN
    let error = client.invoke("greet", Value::Null).await.unwrap_err();

    // THEN
    assert!(matches!(error, ClientError::Transport { .. }));
    assert!(error.to_string().contains("No handler registered for 'zzzzz:greet'"));
}

/// **VALUE**: Verifies a reply that is not an envelope is a Decode error.
///
/// **WHY THIS MATTERS**: A misbehaving host must not be mistaken for a successful call.
///
/// **BUG THIS CATCHES**: Would catch raw values being accepted as data.
#[tokio::test]
async fn given_non_envelope_reply_when_invoked_then_decode_error() {
    // GIVEN: A handler replying with a bare number
    let transport = Arc::new(LocalTransport::new());
    let (_, renderer) = transport.open_window(EXAMPLE_WINDOW);
    let id = WindowId::from("abcde");
    transport
        .handle(
            &scoped_name(&id, "raw"),
            request_handler(|_| async { json!(42) }),
        )
        .unwrap();
    let client = RawClient::new(id, EXAMPLE_WINDOW, renderer);

    // WHEN / THEN
    let error = client.invoke("raw", Value::Null).await.unwrap_err();
    assert!(matches!(error, ClientError::Decode { .. }));
}

/// **VALUE**: Verifies respond::<M> completes a pending renderer-ack call with typed data.
///
/// **WHY THIS MATTERS**: This is the page side of the response-wait pattern.
///
/// **BUG THIS CATCHES**: Would catch respond() using a different channel than the
/// controller waits on.
#[tokio::test]
async fn given_pending_pick_color_when_page_responds_then_caller_gets_color() {
    // GIVEN: A caller waiting on pickColor
    let harness = open_example_window();
    let id = harness.controller.window_id().clone();
    let client = IpcClient::<ExampleWindow>::new(id.clone(), harness.renderer.clone());
    let caller = client.clone();
    let pending = tokio::spawn(async move { caller.invoke::<PickColor>(()).await });
    assert!(
        wait_until(|| harness.transport.has_handler(&response_channel(&id, "pickColor"))).await
    );

    // WHEN: The page responds
    client
        .respond::<PickColor>(ColorChoice {
            color: String::from("green"),
        })
        .await
        .unwrap();

    // THEN: The caller receives the page's color, not the handler's
    let choice = pending.await.unwrap().unwrap();
    assert_eq!(choice.color, "green");
}

/// **VALUE**: Verifies close_window() closes the window through the close channel.
///
/// **WHY THIS MATTERS**: Pages cannot close their own windows any other way.
///
/// **BUG THIS CATCHES**: Would catch the proxy using a wrong close channel.
#[tokio::test]
async fn given_proxy_when_close_window_then_window_closed() {
    // GIVEN
    let harness = open_example_window();
    let client = IpcClient::<ExampleWindow>::new(
        harness.controller.window_id().clone(),
        harness.renderer.clone(),
    );

    // WHEN
    client.close_window().await.unwrap();

    // THEN
    assert_eq!(harness.window.state(), WindowState::Closed);
}
