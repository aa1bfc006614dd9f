use crate::helpers::{StubBridge, temp_state};

use glancething::commands::{device, playback, server, settings, shortcuts};
use glancething::error::GlanceError;

use host_core::error::CoreErrorKind;

use models::{DeviceState, MAX_SHORTCUTS};

use std::sync::Arc;

use serde_json::json;

/// **VALUE**: `find_device` distinguishes "nothing attached" from "bridge broken".
///
/// **BUG THIS CATCHES**: Would catch a bridge failure being folded into `false`,
/// which hides a missing adb from the setup flow.
#[tokio::test]
async fn given_bridge_states_when_finding_device_then_reports_presence_or_error() {
    // GIVEN: No device attached
    let bridge = Arc::new(StubBridge::default());
    let (_dir, state) = temp_state(Arc::clone(&bridge));

    // THEN: Not found is a normal answer
    assert!(!device::find_device(&state).await.unwrap());

    // WHEN: The bridge itself fails
    bridge.set_fail_list(true);

    // THEN: The failure is surfaced
    let result = device::find_device(&state).await;
    assert!(matches!(result, Err(GlanceError::Core { .. })), "got {result:?}");
}

/// **VALUE**: The setup check reports all three setup states without side effects.
///
/// **BUG THIS CATCHES**: Would catch the setup check installing the app on its own.
#[tokio::test]
async fn given_device_not_installed_when_finding_setup_device_then_reports_not_installed() {
    // GIVEN: A device without the app
    let bridge = Arc::new(StubBridge::with_device("8a3c", false));
    let (_dir, state) = temp_state(Arc::clone(&bridge));

    // WHEN: Probing
    let found = device::find_setup_device(&state).await.unwrap();

    // THEN: Not installed, and nothing was installed
    assert_eq!(found, DeviceState::NotInstalled);
    assert_eq!(bridge.install_count(), 0);
}

/// **VALUE**: A device unplugged between listing and the install check reads as
/// not found.
///
/// **BUG THIS CATCHES**: Would catch a stale handle surfacing as a fatal error in
/// the setup flow instead of the normal "not found" answer.
#[tokio::test]
async fn given_device_lost_during_check_when_finding_setup_device_then_not_found() {
    // GIVEN: A listed device whose install check fails as gone
    let bridge = Arc::new(StubBridge::with_device("gone", false));
    bridge.set_lose_device_on_check(true);
    let (_dir, state) = temp_state(Arc::clone(&bridge));

    // WHEN: Probing
    let found = device::find_setup_device(&state).await;

    // THEN: NotFound, not an error
    assert_eq!(found.ok(), Some(DeviceState::NotFound));
}

#[tokio::test]
async fn given_installed_or_missing_device_when_finding_setup_device_then_reports_state() {
    let (_dir, ready) = temp_state(Arc::new(StubBridge::with_device("8a3c", true)));
    let (_dir2, missing) = temp_state(Arc::new(StubBridge::default()));

    assert_eq!(device::find_setup_device(&ready).await.unwrap(), DeviceState::Ready);
    assert_eq!(
        device::find_setup_device(&missing).await.unwrap(),
        DeviceState::NotFound
    );
}

/// **VALUE**: Install needs a device and reports install failures.
///
/// **BUG THIS CATCHES**: Would catch `install_app` silently succeeding with
/// nothing attached.
#[tokio::test]
async fn given_no_device_when_installing_then_returns_no_device() {
    // GIVEN: Nothing attached
    let (_dir, state) = temp_state(Arc::new(StubBridge::default()));

    // WHEN: Installing
    let result = device::install_app(&state).await;

    // THEN: NoDevice
    assert!(matches!(result, Err(GlanceError::NoDevice { .. })), "got {result:?}");
}

#[tokio::test]
async fn given_failing_install_when_installing_then_returns_core_error() {
    // GIVEN: A device whose install fails
    let bridge = Arc::new(StubBridge::with_device("8a3c", false));
    bridge.set_fail_install(true);
    let (_dir, state) = temp_state(Arc::clone(&bridge));

    // WHEN: Installing
    let result = device::install_app(&state).await;

    // THEN: The install failure reaches the caller, typed
    match result {
        Err(GlanceError::Core { cause, message, .. }) => {
            assert_eq!(
                cause,
                CoreErrorKind::InstallFailed {
                    reason: "remount refused".to_string()
                }
            );
            assert!(message.contains("remount refused"));
        }
        other => panic!("Expected Core error, got {other:?}"),
    }
    assert_eq!(bridge.install_count(), 1);
}

/// **VALUE**: A manual trigger runs a full watcher pass.
///
/// **BUG THIS CATCHES**: Would catch the trigger returning a stale state
/// instead of evaluating the device, or forwarding to the configured port (0
/// here) instead of the bound one.
#[tokio::test]
async fn given_installed_device_when_triggering_update_then_ready_and_forwarded() {
    // GIVEN: An installed device
    let bridge = Arc::new(StubBridge::with_device("8a3c", true));
    let (_dir, state) = temp_state(Arc::clone(&bridge));
    let address = server::start_server(&state).await.unwrap();

    // WHEN: Triggering a pass
    let result = device::trigger_device_state_update(&state).await;

    // THEN: Ready, with the tunnel pointing at the port the server bound
    assert_eq!(result, DeviceState::Ready);
    assert_eq!(*bridge.forwarded_ports.lock().unwrap(), vec![address.port()]);

    server::stop_server(&state).await;
}

/// **VALUE**: Server start is idempotent and stop is observable.
///
/// **BUG THIS CATCHES**: Would catch a second start trying to bind again.
#[tokio::test]
async fn given_started_server_when_starting_again_then_same_address() {
    // GIVEN: A started server
    let (_dir, state) = temp_state(Arc::new(StubBridge::default()));
    let first = server::start_server(&state).await.unwrap();

    // WHEN: Starting again
    let second = server::start_server(&state).await.unwrap();

    // THEN: Same listener
    assert_eq!(first, second);
    assert!(server::is_server_started(&state).await);

    // WHEN: Stopping
    server::stop_server(&state).await;

    // THEN: Not started
    assert!(!server::is_server_started(&state).await);
}

/// **VALUE**: Forwarding targets the port the server actually bound.
///
/// **BUG THIS CATCHES**: Would catch forwarding to the configured port (0 here)
/// while the listener sits on an ephemeral one.
#[tokio::test]
async fn given_running_server_when_forwarding_then_uses_bound_port() {
    // GIVEN: A device and a running server
    let bridge = Arc::new(StubBridge::with_device("8a3c", true));
    let (_dir, state) = temp_state(Arc::clone(&bridge));
    let address = server::start_server(&state).await.unwrap();

    // WHEN: Forwarding
    server::forward_socket_server(&state).await.unwrap();

    // THEN: The bound port was forwarded
    assert_eq!(*bridge.forwarded_ports.lock().unwrap(), vec![address.port()]);

    server::stop_server(&state).await;
}

/// **VALUE**: The ninth shortcut is refused before reaching the registry, and
/// removing one frees a slot.
///
/// **BUG THIS CATCHES**: Would catch the caller-side capacity check being dropped
/// or off by one.
#[tokio::test]
async fn given_full_registry_when_adding_then_rejected_until_one_removed() {
    // GIVEN: Eight shortcuts
    let (_dir, state) = temp_state(Arc::new(StubBridge::default()));
    for i in 0..MAX_SHORTCUTS {
        shortcuts::add_shortcut(&state, Some(format!("s{i}")), "echo hi")
            .await
            .unwrap();
    }

    // WHEN: Adding a ninth
    let result = shortcuts::add_shortcut(&state, None, "echo nine").await;

    // THEN: Rejected, registry unchanged
    assert!(matches!(result, Err(GlanceError::Validation { .. })), "got {result:?}");
    assert_eq!(shortcuts::get_shortcuts(&state).await.len(), MAX_SHORTCUTS);

    // WHEN: Removing one and adding again
    shortcuts::remove_shortcut(&state, "s3").await.unwrap();
    let added = shortcuts::add_shortcut(&state, None, "echo nine").await.unwrap();

    // THEN: The new one lands at the end with a generated id
    let list = shortcuts::get_shortcuts(&state).await;
    assert_eq!(list.len(), MAX_SHORTCUTS);
    assert_eq!(list.last().unwrap().id, added.id);
    assert!(!added.id.is_empty());
}

/// **VALUE**: An image uploaded before the shortcut exists follows it on add.
///
/// **BUG THIS CATCHES**: Would catch the pending `new` image being left behind
/// or never attached.
#[tokio::test]
async fn given_pending_image_when_adding_shortcut_then_image_is_adopted() {
    // GIVEN: An uploaded pending image
    let (dir, state) = temp_state(Arc::new(StubBridge::default()));
    let source = dir.path().join("icon.png");
    std::fs::write(&source, b"\x89PNG fake").unwrap();
    shortcuts::upload_shortcut_image(&state, "new", &source)
        .await
        .unwrap();

    // WHEN: Adding the shortcut
    shortcuts::add_shortcut(&state, Some("term".to_string()), "xterm")
        .await
        .unwrap();

    // THEN: The image belongs to the shortcut and the pending one is gone
    let path = shortcuts::get_shortcut_image_path(&state, "term").unwrap();
    assert!(path.is_file());
    assert!(shortcuts::get_shortcut_image_path(&state, "new").is_none());
}

#[tokio::test]
async fn given_pending_image_when_removing_new_image_then_it_is_deleted() {
    // GIVEN: A pending image
    let (dir, state) = temp_state(Arc::new(StubBridge::default()));
    let source = dir.path().join("icon.png");
    std::fs::write(&source, b"\x89PNG fake").unwrap();
    shortcuts::upload_shortcut_image(&state, "new", &source)
        .await
        .unwrap();

    // WHEN: Discarding it, twice
    shortcuts::remove_new_shortcut_image(&state).await.unwrap();
    shortcuts::remove_new_shortcut_image(&state).await.unwrap();

    // THEN: Nothing left
    assert!(shortcuts::get_shortcut_image_path(&state, "new").is_none());
}

#[tokio::test]
async fn given_unknown_shortcut_when_updating_then_returns_core_error() {
    let (_dir, state) = temp_state(Arc::new(StubBridge::default()));

    let result = shortcuts::update_shortcut(&state, "missing", "true").await;

    match result {
        Err(GlanceError::Core { cause, .. }) => assert_eq!(
            cause,
            CoreErrorKind::ShortcutNotFound {
                id: "missing".to_string()
            }
        ),
        other => panic!("Expected Core error, got {other:?}"),
    }
}

/// **VALUE**: A bridge failure keeps its type on the way to the UI.
///
/// **BUG THIS CATCHES**: Would catch every core failure collapsing into one
/// untyped error that the UI can only string-match.
#[tokio::test]
async fn given_missing_adb_when_finding_device_then_cause_is_bridge_unavailable() {
    // GIVEN: A bridge that cannot run adb
    let bridge = Arc::new(StubBridge::default());
    bridge.set_fail_list(true);
    let (_dir, state) = temp_state(bridge);

    // WHEN: Finding a device
    let err = device::find_device(&state).await.unwrap_err();

    // THEN: Typed cause, serialized under data.cause.kind
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["type"], "Core");
    assert_eq!(json["data"]["cause"]["kind"], "bridge_unavailable");
}

/// **VALUE**: Storage values round-trip, and the socket secret stays private.
///
/// **BUG THIS CATCHES**: Would catch the UI being able to read or overwrite
/// `socketPassword` through the generic storage API.
#[tokio::test]
async fn given_storage_values_when_setting_and_getting_then_secret_is_hidden() {
    // GIVEN: A fresh host
    let (_dir, state) = temp_state(Arc::new(StubBridge::default()));

    // WHEN: Setting a regular value
    settings::set_storage_value(&state, "installAutomatically", json!(true))
        .await
        .unwrap();

    // THEN: It reads back
    assert_eq!(
        settings::get_storage_value(&state, "installAutomatically").await,
        Some(json!(true))
    );

    // AND: The secret is neither writable nor readable
    let write = settings::set_storage_value(&state, "socketPassword", json!("x")).await;
    assert!(write.is_err());
    state.credentials().get_secret().await.unwrap();
    assert_eq!(settings::get_storage_value(&state, "socketPassword").await, None);
}

#[tokio::test]
async fn given_dev_mode_setting_when_asking_then_dev_mode_reported() {
    let (_dir, state) = temp_state(Arc::new(StubBridge::default()));

    settings::set_storage_value(&state, "devMode", json!(true))
        .await
        .unwrap();

    assert!(settings::is_dev_mode(&state).await);
}

#[test]
fn given_crate_when_getting_version_then_matches_package_version() {
    assert_eq!(settings::get_version(), env!("CARGO_PKG_VERSION"));
}

/// **VALUE**: An empty token never starts a poller.
///
/// **BUG THIS CATCHES**: Would catch a poller spinning on guaranteed 401s.
#[tokio::test]
async fn given_empty_token_when_setting_spotify_token_then_rejected() {
    let (_dir, state) = temp_state(Arc::new(StubBridge::default()));

    let result = playback::set_spotify_token(&state, "  ".to_string()).await;

    assert!(matches!(result, Err(GlanceError::Validation { .. })), "got {result:?}");
    assert!(!state.has_playback().await);
}

#[tokio::test]
async fn given_token_when_setting_and_clearing_then_poller_follows() {
    // GIVEN: A token
    let (_dir, state) = temp_state(Arc::new(StubBridge::default()));

    // WHEN: Setting it
    playback::set_spotify_token(&state, "token".to_string())
        .await
        .unwrap();

    // THEN: A poller runs
    assert!(state.has_playback().await);

    // WHEN: Clearing
    playback::clear_spotify_token(&state).await;

    // THEN: None
    assert!(!state.has_playback().await);
}
