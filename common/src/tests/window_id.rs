use crate::WindowId;
use crate::window_id::{WINDOW_ID_LENGTH, WINDOW_ID_MAX_LENGTH, WINDOW_ID_MIN_LENGTH};

use std::collections::HashSet;

/// **VALUE**: Verifies generated ids keep the 5-character base-36 shape.
///
/// **WHY THIS MATTERS**: Presentation code and log tooling may assume the id length; silently
/// switching to a UUID would break them.
///
/// **BUG THIS CATCHES**: Would catch a changed default length or uppercase/punctuation leaking
/// into ids (which could also break the channel naming regex assumptions).
#[test]
fn given_default_generation_when_generating_id_then_five_lowercase_base36_chars() {
    // WHEN: Generating an id
    let id = WindowId::generate();

    // THEN: Five characters, all base 36
    assert_eq!(id.as_str().len(), WINDOW_ID_LENGTH);
    assert!(
        id.as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()),
        "Unexpected characters in {id}"
    );
}

/// **VALUE**: Verifies custom lengths are honoured and clamped.
///
/// **WHY THIS MATTERS**: `window_id_length` is configurable; out-of-range values must not panic
/// or produce empty ids.
///
/// **BUG THIS CATCHES**: Would catch an index overflow for lengths above what one UUID supplies.
#[test]
fn given_length_outside_range_when_generating_then_length_is_clamped() {
    assert_eq!(WindowId::generate_with_length(12).as_str().len(), 12);
    assert_eq!(
        WindowId::generate_with_length(0).as_str().len(),
        WINDOW_ID_MIN_LENGTH
    );
    assert_eq!(
        WindowId::generate_with_length(WINDOW_ID_MIN_LENGTH).as_str().len(),
        WINDOW_ID_MIN_LENGTH
    );
    assert_eq!(
        WindowId::generate_with_length(100).as_str().len(),
        WINDOW_ID_MAX_LENGTH
    );
}

/// **VALUE**: Verifies ids are random enough to namespace concurrently open windows.
///
/// **WHY THIS MATTERS**: Two windows with the same id would collide on every channel.
///
/// **BUG THIS CATCHES**: Would catch a constant or time-seeded generator that repeats.
#[test]
fn given_many_generations_when_comparing_then_ids_are_mostly_unique() {
    // GIVEN / WHEN: A batch of ids (36^5 ~ 60M space)
    let ids: HashSet<WindowId> = (0..200).map(|_| WindowId::generate()).collect();

    // THEN: Collisions are (almost certainly) absent
    assert!(ids.len() >= 199, "Too many collisions: {}", ids.len());
}

/// **VALUE**: Verifies ids serialize as plain strings.
///
/// **WHY THIS MATTERS**: The handshake payload carries `windowId` as a JSON string that the
/// presentation side reads back.
///
/// **BUG THIS CATCHES**: Would catch losing `#[serde(transparent)]`.
#[test]
fn given_window_id_when_serialized_then_plain_string() {
    let id = WindowId::from("ab12c");
    assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("ab12c"));
    let back: WindowId = serde_json::from_value(serde_json::json!("ab12c")).unwrap();
    assert_eq!(back, id);
}
