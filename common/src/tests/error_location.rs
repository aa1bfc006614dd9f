use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` records the file it was called from.
///
/// **WHY THIS MATTERS**: Every bridge, socket and registry error embeds a location.
/// If capture breaks, a failed install on a user's machine can't be traced back.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` propagation breaks or the
/// file/column fields are swapped during a refactor.
#[test]
#[track_caller]
fn given_location_caller_when_error_location_created_then_captures_this_file() {
    // GIVEN/WHEN: Capturing the current location
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should point into this test file with a real column
    assert!(location.file.contains("error_location.rs"));
    assert!(location.line > 0, "Line should be captured");
    assert!(location.column > 0, "Column should be captured");
}

/// **VALUE**: Verifies the `[file:line:column]` rendering used in every error message.
///
/// **WHY THIS MATTERS**: Log lines are grepped for the bracketed suffix when users send
/// in `glancething.log`.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops the brackets or a field.
#[test]
fn given_fixed_location_when_formatted_then_renders_bracketed_triplet() {
    // GIVEN: A hand-built location
    let location = ErrorLocation {
        file: "backend/host-core/src/bridge/device.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting
    let formatted = location.to_string();

    // THEN: Exact bracketed format
    assert_eq!(formatted, "[backend/host-core/src/bridge/device.rs:42:7]");
}

/// **VALUE**: Verifies `file_name()` strips directories for both separators.
///
/// **WHY THIS MATTERS**: Windows builds report backslash paths; compact names keep
/// log lines readable on both platforms.
///
/// **BUG THIS CATCHES**: Would catch a split that only handles `/`.
#[test]
fn given_unix_and_windows_paths_when_file_name_called_then_returns_last_segment() {
    // GIVEN: Locations with both separator styles
    let unix = ErrorLocation {
        file: "src/socket/server.rs",
        line: 1,
        column: 1,
    };
    let windows = ErrorLocation {
        file: "src\\socket\\server.rs",
        line: 1,
        column: 1,
    };

    // WHEN/THEN: Both collapse to the bare file name
    assert_eq!(unix.file_name(), "server.rs");
    assert_eq!(windows.file_name(), "server.rs");
}

/// **VALUE**: Verifies distinct call sites produce distinct lines through `#[track_caller]`.
///
/// **BUG THIS CATCHES**: Would catch a helper losing `#[track_caller]`, which makes every
/// error report the helper's own line instead of the failing call.
#[test]
fn given_tracked_helper_when_called_twice_then_lines_differ() {
    #[track_caller]
    fn capture() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    let first = capture();
    let second = capture();

    assert_eq!(first.file, second.file);
    assert_eq!(first.line + 1, second.line, "Lines should be sequential");
}
