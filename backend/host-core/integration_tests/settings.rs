use crate::helpers::{temp_credentials, temp_settings};

use host_core::error::ConfigError;
use host_core::settings::{SETTINGS_FILE_NAME, SOCKET_PASSWORD_KEY, Settings, SettingsState};

use serde_json::{Value, json};

/// **VALUE**: Verifies a stored value is visible immediately and persisted to disk.
#[tokio::test]
async fn given_set_value_when_read_back_then_memory_and_disk_agree() {
    // GIVEN: Fresh settings
    let (dir, settings) = temp_settings(Settings::default());

    // WHEN: Enabling auto-install
    settings
        .set_value("installAutomatically", Value::Bool(true))
        .await
        .unwrap();

    // THEN: Visible in memory and in a freshly loaded copy
    assert!(settings.install_automatically().await);
    let reloaded = Settings::load(dir.path()).unwrap();
    assert!(reloaded.install_automatically);
}

#[tokio::test]
async fn given_invalid_value_when_set_then_rejected_and_unchanged() {
    // GIVEN: Fresh settings
    let (dir, settings) = temp_settings(Settings::default());

    // WHEN: Wrong type for a known key
    let result = settings.set_value("launchMinimized", json!(3)).await;

    // THEN: Rejected, nothing written
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    assert_eq!(settings.get_value("launchMinimized").await, Some(Value::Bool(false)));
    assert!(!dir.path().join(SETTINGS_FILE_NAME).exists());
}

/// **VALUE**: Verifies the secret cannot be read or overwritten through the generic API.
///
/// **BUG THIS CATCHES**: Would catch the UI storage bridge leaking the socket password.
#[tokio::test]
async fn given_socket_password_key_when_accessed_generically_then_hidden_and_read_only() {
    // GIVEN: A secret has been issued
    let (_dir, settings, credentials) = temp_credentials(Settings::default());
    credentials.get_secret().await.unwrap();

    // WHEN / THEN: Not readable, not writable
    assert_eq!(settings.get_value(SOCKET_PASSWORD_KEY).await, None);
    assert!(settings
        .set_value(SOCKET_PASSWORD_KEY, json!("mine"))
        .await
        .is_err());
}

/// **VALUE**: Verifies the secret is generated once and reused across restarts.
///
/// **WHY THIS MATTERS**: The device holds a copy written at install time; rotating it
/// silently would lock the device out until reinstall.
#[tokio::test]
async fn given_issued_secret_when_store_recreated_then_same_secret() {
    // GIVEN: A secret issued by one store
    let (dir, _settings, credentials) = temp_credentials(Settings::default());
    let first = credentials.get_secret().await.unwrap().expose().to_string();

    // WHEN: A new store reads the persisted settings
    let reloaded = SettingsState::new(dir.path().to_path_buf(), Settings::load(dir.path()).unwrap());
    let second_store = host_core::credentials::CredentialStore::new(reloaded);
    let second = second_store.get_secret().await.unwrap().expose().to_string();

    // THEN: Same value, 32 characters
    assert_eq!(first, second);
    assert_eq!(first.len(), 32);
    assert!(second_store.verify(&first).await.unwrap());
    assert!(!second_store.verify("wrong").await.unwrap());
}

#[tokio::test]
async fn given_disable_socket_auth_set_when_queried_then_auth_disabled() {
    // GIVEN: Auth enabled by default
    let (_dir, settings, credentials) = temp_credentials(Settings::default());
    assert!(!credentials.is_auth_disabled().await);

    // WHEN: Disabled through the settings API
    settings
        .set_value("disableSocketAuth", Value::Bool(true))
        .await
        .unwrap();

    // THEN
    assert!(credentials.is_auth_disabled().await);
}
