use crate::{DeviceHandle, DeviceState};

/// **VALUE**: Verifies the wire names of every device state.
///
/// **WHY THIS MATTERS**: The UI and the device match on these exact strings
/// (`not_found`, `not_installed`, `installing`, `ready`).
///
/// **BUG THIS CATCHES**: Would catch a dropped `rename_all` or a renamed variant.
#[test]
fn given_each_state_when_serialized_then_uses_snake_case_wire_name() {
    let cases = [
        (DeviceState::NotFound, "\"not_found\""),
        (DeviceState::NotInstalled, "\"not_installed\""),
        (DeviceState::Installing, "\"installing\""),
        (DeviceState::Ready, "\"ready\""),
    ];

    for (state, expected) in cases {
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, expected);
        assert_eq!(format!("\"{state}\""), expected, "Display matches wire name");
    }
}

#[test]
fn given_handle_when_serialized_then_is_bare_serial() {
    let handle = DeviceHandle::new("8551XYZ");

    assert_eq!(serde_json::to_string(&handle).unwrap(), "\"8551XYZ\"");
    assert_eq!(handle.serial(), "8551XYZ");
}
