use crate::ErrorLocation;
use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures this file and a real position.
///
/// **WHY THIS MATTERS**: Every error in the workspace carries an `ErrorLocation`. If it stops
/// pointing at the construction site, duplicate-handler and transport errors lose the only
/// clue about which registration went wrong.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` stops being propagated or if the
/// file/line/column fields get swapped.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN / WHEN: Capturing the current location
    let location = ErrorLocation::from(Location::caller());

    // THEN: File, line and column are populated
    assert!(
        location.file.ends_with("error_location.rs"),
        "Should capture file path, got {}",
        location.file
    );
    assert!(location.line > 0, "Should capture line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the bracketed `[file:line:column]` Display format.
///
/// **WHY THIS MATTERS**: Error messages in logs end with this suffix; tooling and humans rely
/// on it to jump to the failing call site.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops the brackets or a component.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: An ErrorLocation
    let location = ErrorLocation {
        file: "src/registry/builder.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Exact bracketed format
    assert_eq!(formatted, "[src/registry/builder.rs:42:7]");
}

/// **VALUE**: Verifies that `#[track_caller]` propagates through `ErrorLocation::caller()`.
///
/// **WHY THIS MATTERS**: Error constructors across the workspace are `#[track_caller]`. If the
/// helper reported its own position, every error would point into this crate.
///
/// **BUG THIS CATCHES**: Would catch removal of `#[track_caller]` from `ErrorLocation::caller`.
#[test]
fn given_two_call_sites_when_capturing_via_helper_then_lines_differ() {
    // GIVEN: A tracked helper
    #[track_caller]
    fn capture() -> ErrorLocation {
        ErrorLocation::caller()
    }

    // WHEN: Capturing from two different lines
    let first = capture();
    let second = capture();

    // THEN: Both point into this file on consecutive lines
    assert_eq!(first.file, second.file, "Should have same file");
    assert!(first.file.ends_with("error_location.rs"));
    assert_eq!(first.line + 1, second.line, "Lines should be sequential");
}
