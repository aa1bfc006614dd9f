use crate::{AuthAck, ClientMessage, DeviceState, ServerMessage, Shortcut};

use serde_json::json;

/// **VALUE**: Verifies the device's handshake frame parses into `ClientMessage::Auth`.
///
/// **WHY THIS MATTERS**: The device sends `{"type":"auth","data":"<password>"}` as soon as
/// it connects. If this stops parsing, every connection times out unauthenticated.
///
/// **BUG THIS CATCHES**: Would catch a change of tag/content keys on the enum.
#[test]
fn given_auth_frame_when_parsed_then_yields_auth_with_secret() {
    // GIVEN: The frame the device client sends
    let frame = json!({"type": "auth", "data": "abc123"}).to_string();

    // WHEN: Parsing
    let message: ClientMessage = serde_json::from_str(&frame).unwrap();

    // THEN: Auth with the secret
    assert_eq!(message, ClientMessage::Auth(String::from("abc123")));
    assert_eq!(message.kind(), "auth");
}

/// **VALUE**: Verifies a data-less request (`{"type":"shortcuts"}`) parses.
///
/// **BUG THIS CATCHES**: Would catch the unit variant requiring a `data` field.
#[test]
fn given_frame_without_data_when_parsed_then_yields_unit_request() {
    let message: ClientMessage = serde_json::from_str(r#"{"type":"shortcuts"}"#).unwrap();

    assert_eq!(message, ClientMessage::Shortcuts);
}

/// **VALUE**: Verifies `shortcut_add` accepts a missing id (server assigns one).
#[test]
fn given_add_without_id_when_parsed_then_id_is_none() {
    let frame = json!({"type": "shortcut_add", "data": {"command": "spotify"}}).to_string();

    let message: ClientMessage = serde_json::from_str(&frame).unwrap();

    assert_eq!(
        message,
        ClientMessage::ShortcutAdd {
            id: None,
            command: String::from("spotify")
        }
    );
}

/// **VALUE**: Verifies unknown message kinds are rejected rather than misrouted.
///
/// **WHY THIS MATTERS**: The server ignores frames it can't parse; a permissive parser
/// could map garbage onto a mutation.
#[test]
fn given_unknown_kind_when_parsed_then_errors() {
    let result = serde_json::from_str::<ClientMessage>(r#"{"type":"format_disk","data":{}}"#);

    assert!(result.is_err());
}

/// **VALUE**: Verifies the server push envelopes the device renders.
///
/// **BUG THIS CATCHES**: Would catch `device_state` being emitted as `DeviceState` or a
/// shortcut image path leaking as `image_path` instead of `imagePath`.
#[test]
fn given_server_pushes_when_serialized_then_use_type_data_envelope() {
    let state = ServerMessage::DeviceState(DeviceState::Ready).to_json().unwrap();
    assert_eq!(state, r#"{"type":"device_state","data":"ready"}"#);

    let ack = ServerMessage::Auth(AuthAck { success: true }).to_json().unwrap();
    assert_eq!(ack, r#"{"type":"auth","data":{"success":true}}"#);

    let shortcuts = ServerMessage::Shortcuts(vec![Shortcut {
        id: String::from("a1"),
        command: String::from("code"),
        image_path: Some("/tmp/a1.png".into()),
    }])
    .to_json()
    .unwrap();
    assert_eq!(
        shortcuts,
        r#"{"type":"shortcuts","data":[{"id":"a1","command":"code","imagePath":"/tmp/a1.png"}]}"#
    );

    let idle = ServerMessage::Playback(None).to_json().unwrap();
    assert_eq!(idle, r#"{"type":"playback","data":null}"#);
}
