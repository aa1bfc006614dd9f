//! Shared fixtures for host-core integration tests.

pub mod fake_bridge;
pub mod socket_client;

use host_core::credentials::CredentialStore;
use host_core::settings::{Settings, SettingsState};

use tempfile::TempDir;

/// Settings rooted in a fresh temp dir; keep the `TempDir` alive for the test.
pub fn temp_settings(settings: Settings) -> (TempDir, SettingsState) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let state = SettingsState::new(dir.path().to_path_buf(), settings);
    (dir, state)
}

pub fn temp_credentials(settings: Settings) -> (TempDir, SettingsState, CredentialStore) {
    let (dir, state) = temp_settings(settings);
    let credentials = CredentialStore::new(state.clone());
    (dir, state, credentials)
}
