use crate::error::transport::TransportError;
use crate::transport::ws::WireFrame;

use serde_json::json;

/// **VALUE**: Verifies Debug output never contains the auth token.
///
/// **WHY THIS MATTERS**: Frames are logged at debug level; the token guards the host.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug sneaking back in.
#[test]
fn given_hello_frame_when_debug_formatted_then_token_redacted() {
    // GIVEN
    let frame = WireFrame::Hello {
        token: String::from("super-secret-token"),
        window: String::from("exampleWindow"),
    };

    // WHEN
    let debug = format!("{frame:?}");

    // THEN
    assert!(!debug.contains("super-secret-token"));
    assert!(debug.contains("[REDACTED]"));
    assert!(debug.contains("exampleWindow"));
}

/// **VALUE**: Verifies the wire format is tagged by `type` in snake_case.
///
/// **WHY THIS MATTERS**: The presentation side is not necessarily Rust; the JSON shape is
/// the protocol.
///
/// **BUG THIS CATCHES**: Would catch a serde attribute change breaking other clients.
#[test]
fn given_json_text_when_decoding_then_tagged_variants_parsed() {
    // GIVEN
    let invoke = r#"{"type":"invoke","id":7,"channel":"abcde:greet","payload":{"name":"Ada"}}"#;
    let reply = r#"{"type":"reply","id":7}"#;

    // WHEN
    let invoke = WireFrame::decode(invoke).unwrap();
    let reply = WireFrame::decode(reply).unwrap();

    // THEN
    assert_eq!(
        invoke,
        WireFrame::Invoke {
            id: 7,
            channel: String::from("abcde:greet"),
            payload: json!({"name": "Ada"}),
        }
    );
    assert_eq!(reply.kind(), "reply");

    let encoded: serde_json::Value = serde_json::from_str(
        &WireFrame::HelloResult {
            success: true,
            error: None,
        }
        .encode()
        .unwrap(),
    )
    .unwrap();
    assert_eq!(encoded, json!({"type": "hello_result", "success": true}));
}

/// **VALUE**: Verifies unknown or malformed frames are rejected as frame errors.
///
/// **BUG THIS CATCHES**: Would catch garbage being mapped onto a default variant.
#[test]
fn given_invalid_text_when_decoding_then_frame_error() {
    for text in ["not json", r#"{"type":"shout"}"#, r#"{"type":"invoke"}"#] {
        assert!(
            matches!(WireFrame::decode(text), Err(TransportError::Frame { .. })),
            "{text} should be rejected"
        );
    }
}
