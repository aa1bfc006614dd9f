use crate::config::HostConfig;
use crate::error::config::ConfigError;

use std::time::Duration;

use tempfile::TempDir;

/// **VALUE**: Verifies first-run behavior: no `host.json` means defaults, not an error.
#[test]
fn given_no_config_file_when_load_called_then_returns_defaults() {
    // GIVEN: An empty data directory
    let dir = TempDir::new().unwrap();

    // WHEN: Loading
    let config = HostConfig::load(dir.path()).unwrap();

    // THEN: Defaults match the device protocol
    assert_eq!(config, HostConfig::default());
    assert_eq!(config.socket.port, 1337);
    assert_eq!(config.auth_timeout(), Duration::from_secs(5));
    assert_eq!(config.watch_interval(), Duration::from_secs(5));
    assert_eq!(config.command_timeout(), Duration::from_secs(30));
}

#[test]
fn given_saved_config_when_loaded_then_values_survive() {
    // GIVEN: A customized config saved to disk
    let dir = TempDir::new().unwrap();
    let mut config = HostConfig::default();
    config.socket.port = 4040;
    config.bridge.allow_download = false;
    config.save(dir.path()).unwrap();

    // WHEN: Loading it back
    let loaded = HostConfig::load(dir.path()).unwrap();

    // THEN: Same values, and no temp file left behind
    assert_eq!(loaded, config);
    assert!(!dir.path().join("host.json.tmp").exists());
}

/// **VALUE**: Verifies partial files fill the gaps with defaults.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]` that makes every
/// hand-edited config fail to parse.
#[test]
fn given_partial_config_when_loaded_then_missing_sections_use_defaults() {
    // GIVEN: Only the socket port set
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("host.json"), r#"{"socket":{"port":9000}}"#).unwrap();

    // WHEN: Loading
    let config = HostConfig::load(dir.path()).unwrap();

    // THEN: Port overridden, everything else default
    assert_eq!(config.socket.port, 9000);
    assert_eq!(config.socket.auth_timeout_ms, 5_000);
    assert_eq!(config.watcher, Default::default());
}

#[test]
fn given_corrupt_config_when_loaded_then_parse_error() {
    // GIVEN: Invalid JSON
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("host.json"), "{ not json").unwrap();

    // WHEN / THEN
    assert!(matches!(
        HostConfig::load(dir.path()),
        Err(ConfigError::ParseError { .. })
    ));
}

/// **VALUE**: Verifies validation rejects values that would break the runtime loops.
///
/// **BUG THIS CATCHES**: A zero poll interval would panic `tokio::time::interval`.
#[test]
fn given_invalid_values_when_validated_then_validation_error() {
    // GIVEN: Several invalid configs
    let mut zero_poll = HostConfig::default();
    zero_poll.watcher.poll_interval_ms = 0;

    let mut bad_url = HostConfig::default();
    bad_url.playback.api_base_url = "api.spotify.com".to_string();

    let mut bad_version = HostConfig::default();
    bad_version.version = 99;

    // WHEN / THEN: Each is rejected
    for config in [zero_poll, bad_url, bad_version] {
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
