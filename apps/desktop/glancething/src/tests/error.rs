// Unit tests for the app-facing error type

use crate::error::GlanceError;

use common::ErrorLocation;

use host_core::error::{CoreError, CoreErrorKind, ShortcutError};

use std::panic::Location;

/// **VALUE**: Tests the `{type, data}` shape the UI layer relies on.
///
/// **BUG THIS CATCHES**: Would catch if the serde tag/content attributes were
/// dropped, which flattens the variant name into the payload.
#[test]
fn given_no_device_error_when_serialized_then_uses_type_and_data() {
    // GIVEN: A NoDevice error
    let err = GlanceError::NoDevice {
        message: String::from("Nothing attached"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_value(&err).unwrap();

    // THEN: Variant and message sit under type/data
    assert_eq!(json["type"], "NoDevice");
    assert_eq!(json["data"]["message"], "Nothing attached");
}

/// **VALUE**: Core failures keep their message and typed cause when converted.
///
/// **BUG THIS CATCHES**: Would catch a conversion that discards the core
/// error text, leaving the UI with an opaque failure.
#[test]
fn given_core_error_when_converted_then_message_is_kept() {
    // GIVEN: A shortcut capacity error wrapped in CoreError
    let core = CoreError::from(ShortcutError::CapacityExceeded {
        max: 8,
        location: ErrorLocation::from(Location::caller()),
    });
    let expected = core.to_string();

    // WHEN: Converting
    let err = GlanceError::from(core);

    // THEN: The core message survives
    match err {
        GlanceError::Core { cause, message, .. } => {
            assert_eq!(message, expected);
            assert_eq!(cause, CoreErrorKind::CapacityExceeded { max: 8 });
        }
        other => panic!("Expected Core error, got {other:?}"),
    }
}
