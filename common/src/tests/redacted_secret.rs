use crate::RedactedSecret;

/// **VALUE**: Verifies the socket password never appears in Debug or Display output.
///
/// **WHY THIS MATTERS**: Credentials and server state get logged at debug level; the
/// password grants control over the host's shortcut commands.
///
/// **BUG THIS CATCHES**: Would catch someone deriving `Debug` on the wrapper.
#[test]
fn given_secret_when_formatted_then_value_is_hidden() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("hunter2hunter2");

    // WHEN: Formatting both ways
    let debug = format!("{secret:?}");
    let display = format!("{secret}");

    // THEN: Neither contains the value
    assert!(!debug.contains("hunter2"));
    assert!(!display.contains("hunter2"));
    assert_eq!(secret.expose(), "hunter2hunter2");
}

/// **VALUE**: Verifies serialization refuses instead of emitting the value.
///
/// **BUG THIS CATCHES**: Would catch a `#[derive(Serialize)]` sneaking the secret into
/// a JSON push to the device or into settings dumps.
#[test]
fn given_secret_when_serialized_then_errors() {
    let secret = RedactedSecret::new("abc");

    let result = serde_json::to_string(&secret);

    assert!(result.is_err(), "Serialization must fail");
}

/// **VALUE**: Verifies handshake comparison semantics.
///
/// **BUG THIS CATCHES**: Would catch prefix matches or length-mismatch acceptance.
#[test]
fn given_candidates_when_matched_then_only_exact_value_passes() {
    let secret = RedactedSecret::new("s3cret");

    assert!(secret.matches("s3cret"));
    assert!(!secret.matches("s3cre"));
    assert!(!secret.matches("s3cret!"));
    assert!(!secret.matches("S3cret"));
    assert!(!secret.matches(""));
    assert_eq!(secret.len(), 6);
    assert!(!secret.is_empty());
}
