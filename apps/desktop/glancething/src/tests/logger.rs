// Unit tests for logger initialization
// Both tests touch the process-wide logger, so they run serially

use crate::error::GlanceError;
use crate::logger::{LOG_FILE_NAME, initialize, initialize_internal};

use std::path::PathBuf;

use serial_test::serial;
use tempfile::TempDir;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: Startup code and tests may both reach the logger. A second
/// call that errors would abort startup.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed,
/// causing fern to refuse a second global logger.
#[test]
#[serial]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A writable directory
    let temp_dir = TempDir::new().unwrap();

    // WHEN: Calling initialize twice
    let first = initialize(temp_dir.path());
    let second = initialize(temp_dir.path());

    // THEN: Both return Ok
    assert!(first.is_ok(), "First initialization should succeed");
    assert!(second.is_ok(), "Second initialization should be a no-op");
}

/// **VALUE**: Verifies an unusable log directory is an error, not a panic.
///
/// **BUG THIS CATCHES**: Would catch if `fern::log_file()` were unwrapped.
#[test]
#[serial]
fn given_invalid_log_dir_when_initializing_then_returns_glance_error() {
    // GIVEN: A path under a character device
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Building the dispatch
    let result = initialize_internal(&invalid_dir);

    // THEN: The file failure is reported
    match result {
        Err(GlanceError::Glance { message, .. }) => {
            assert!(message.contains(LOG_FILE_NAME), "got: {message}")
        }
        other => panic!("Expected Glance error, got {other:?}"),
    }
}
