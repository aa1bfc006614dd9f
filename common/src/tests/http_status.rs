use crate::HttpStatusCode;

/// **VALUE**: Verifies status classification used by the playback poller.
///
/// **WHY THIS MATTERS**: The poller logs 401/403 as a credential problem and treats
/// 429/5xx as transient; misclassifying floods the log with the wrong advice.
///
/// **BUG THIS CATCHES**: Would catch range boundaries drifting (e.g. 500 counted as client).
#[test]
fn given_status_codes_when_classified_then_match_expected_categories() {
    assert!(HttpStatusCode(401).is_unauthorized());
    assert!(HttpStatusCode(403).is_unauthorized());
    assert!(!HttpStatusCode(404).is_unauthorized());

    assert!(HttpStatusCode(404).is_client_error());
    assert!(!HttpStatusCode(500).is_client_error());
    assert!(HttpStatusCode(500).is_server_error());

    assert!(HttpStatusCode(429).is_transient());
    assert!(HttpStatusCode(503).is_transient());
    assert!(!HttpStatusCode(400).is_transient());
}

#[test]
fn given_u16_when_converted_then_displays_number() {
    let status: HttpStatusCode = 204.into();
    assert_eq!(status.to_string(), "204");
}
