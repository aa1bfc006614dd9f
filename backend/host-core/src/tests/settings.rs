use crate::error::config::ConfigError;
use crate::settings::Settings;

use serde_json::{Value, json};

/// **VALUE**: Verifies settings use the camelCase keys the UI stores values under.
///
/// **BUG THIS CATCHES**: Would catch dropping `rename_all`, which silently resets every
/// user setting on upgrade.
#[test]
fn given_settings_when_serialized_then_uses_camel_case_keys() {
    // GIVEN: Settings with auto-install on
    let settings = Settings {
        install_automatically: true,
        ..Default::default()
    };

    // WHEN: Reading by wire key
    let value = settings.value("installAutomatically");

    // THEN: The typed field is visible under its camelCase key
    assert_eq!(value, Some(Value::Bool(true)));
    assert_eq!(settings.value("install_automatically"), None);
}

#[test]
fn given_known_key_when_with_value_called_then_typed_field_updates() {
    // GIVEN: Default settings
    let settings = Settings::default();

    // WHEN: Setting a known key
    let updated = settings
        .with_value("disableSocketAuth", Value::Bool(true))
        .unwrap();

    // THEN: The typed field changed and the original did not
    assert!(updated.disable_socket_auth);
    assert!(!settings.disable_socket_auth);
}

/// **VALUE**: Verifies unknown keys round-trip through the extra map.
///
/// **WHY THIS MATTERS**: The UI stores its own keys (e.g. `firstClose`); losing them
/// would re-show dialogs the user already dismissed.
#[test]
fn given_unknown_key_when_with_value_called_then_kept_in_extra() {
    // GIVEN / WHEN: An unknown key
    let updated = Settings::default()
        .with_value("firstClose", json!(false))
        .unwrap();

    // THEN: Readable back
    assert_eq!(updated.value("firstClose"), Some(json!(false)));
    assert!(updated.extra.contains_key("firstClose"));
}

#[test]
fn given_wrong_type_for_known_key_when_with_value_called_then_validation_error() {
    // GIVEN / WHEN: A string for a boolean setting
    let result = Settings::default().with_value("installAutomatically", json!("yes"));

    // THEN: Rejected instead of silently ignored
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn given_null_value_when_with_value_called_then_key_is_cleared() {
    // GIVEN: An extra key present
    let settings = Settings::default().with_value("sp_dc", json!("cookie")).unwrap();

    // WHEN: Setting it to null
    let cleared = settings.with_value("sp_dc", Value::Null).unwrap();

    // THEN: Gone
    assert_eq!(cleared.value("sp_dc"), None);
}
