// Unit tests for the typed error classification

use crate::error::{BridgeError, CoreError, CoreErrorKind, ShortcutError};

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: The install reason survives classification and serializes flat.
///
/// **BUG THIS CATCHES**: Would catch `InstallFailed` losing its reason, or the
/// `kind` tag being renamed under callers that branch on it.
#[test]
fn given_install_failure_when_classified_then_kind_carries_reason() {
    // GIVEN: An install failure
    let error = CoreError::from(BridgeError::InstallFailed {
        reason: "push failed".to_string(),
        location: ErrorLocation::from(Location::caller()),
    });

    // WHEN: Classifying and serializing
    let kind = error.kind();
    let json = serde_json::to_value(&kind).unwrap();

    // THEN: Tagged by kind, reason alongside
    assert_eq!(
        kind,
        CoreErrorKind::InstallFailed {
            reason: "push failed".to_string()
        }
    );
    assert_eq!(json["kind"], "install_failed");
    assert_eq!(json["reason"], "push failed");
}

#[test]
fn given_timeout_and_missing_shortcut_when_classified_then_distinct_kinds() {
    let timeout = CoreError::from(BridgeError::Timeout {
        message: "adb shell".to_string(),
        location: ErrorLocation::from(Location::caller()),
    });
    let missing = CoreError::from(ShortcutError::NotFound {
        id: "term".to_string(),
        location: ErrorLocation::from(Location::caller()),
    });

    assert_eq!(timeout.kind(), CoreErrorKind::BridgeTimeout);
    assert_eq!(
        missing.kind(),
        CoreErrorKind::ShortcutNotFound {
            id: "term".to_string()
        }
    );
}
