use crate::WindowId;
use crate::channel::{
    DATA_CHANNEL, ack_channel, close_channel, is_reserved_method_name, is_valid_method_name,
    response_channel, scoped_name,
};

/// **VALUE**: Verifies the exact scoped channel format.
///
/// **WHY THIS MATTERS**: Host and presentation side derive names independently; this string
/// is the only thing keeping their namespaces in sync.
///
/// **BUG THIS CATCHES**: Would catch a changed separator or argument order on one side.
#[test]
fn given_window_id_and_method_when_scoping_then_joins_with_colon() {
    let id = WindowId::from("k3x9a");

    assert_eq!(scoped_name(&id, "greet"), "k3x9a:greet");
    assert_eq!(close_channel(&id), "k3x9a:close");
    assert_eq!(ack_channel(&id), "k3x9a:ack");
    assert_eq!(DATA_CHANNEL, "window:data");
}

/// **VALUE**: Verifies the doubled scoping of the response-wait channel.
///
/// **WHY THIS MATTERS**: The presentation side fires this channel by name to complete a
/// pending request; any drift leaves the host waiting forever.
///
/// **BUG THIS CATCHES**: Would catch "flattening" the name on one side only.
#[test]
fn given_method_when_deriving_response_channel_then_id_appears_twice() {
    let id = WindowId::from("k3x9a");

    assert_eq!(response_channel(&id, "pickColor"), "k3x9a:k3x9a:pickColorResponse");
}

/// **VALUE**: Verifies scoping is deterministic and injective for valid method names.
///
/// **WHY THIS MATTERS**: Two distinct `(id, method)` pairs mapping to one channel would route
/// one window's calls into another window's handler.
///
/// **BUG THIS CATCHES**: Would catch method-name validation letting `:` through.
#[test]
fn given_distinct_pairs_when_scoping_then_names_are_distinct_and_stable() {
    // GIVEN: Pairs that could collide if ':' were allowed in method names
    let a = WindowId::from("aaaaa");
    let b = WindowId::from("bbbbb");
    let pairs = [(&a, "greet"), (&a, "greetx"), (&b, "greet"), (&a, "x.greet")];

    // WHEN: Scoping each twice
    let first: Vec<String> = pairs.iter().map(|(id, m)| scoped_name(id, m)).collect();
    let second: Vec<String> = pairs.iter().map(|(id, m)| scoped_name(id, m)).collect();

    // THEN: Stable and pairwise distinct
    assert_eq!(first, second);
    for (i, left) in first.iter().enumerate() {
        for right in first.iter().skip(i + 1) {
            assert_ne!(left, right);
        }
    }
    assert!(!is_valid_method_name("b:greet"));
}

/// **VALUE**: Verifies method name validation and reserved names.
///
/// **WHY THIS MATTERS**: `close` and `ack` are owned by the controller; letting the contract
/// claim them would shadow window closing or the handshake.
///
/// **BUG THIS CATCHES**: Would catch a too-permissive pattern or a missing reserved entry.
#[test]
fn given_candidate_names_when_validating_then_only_identifiers_pass() {
    assert!(is_valid_method_name("greet"));
    assert!(is_valid_method_name("get_settings"));
    assert!(is_valid_method_name("$internal.v2-beta"));
    assert!(!is_valid_method_name(""));
    assert!(!is_valid_method_name("1st"));
    assert!(!is_valid_method_name("with space"));
    assert!(!is_valid_method_name("a:b"));

    assert!(is_reserved_method_name("close"));
    assert!(is_reserved_method_name("ack"));
    assert!(!is_reserved_method_name("greet"));
}
