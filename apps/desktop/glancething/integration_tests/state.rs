use crate::helpers::{StubBridge, temp_state};

use glancething::commands::{server, settings};

use models::DeviceState;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::{sleep, timeout};

/// **VALUE**: Background wiring delivers watcher transitions and shutdown
/// closes everything.
///
/// **BUG THIS CATCHES**: Would catch the relay never being started, or
/// shutdown leaving the listener bound.
#[tokio::test]
async fn given_background_started_when_shutting_down_then_server_and_watcher_stop() {
    // GIVEN: A host with an installed device and a running server
    let bridge = Arc::new(StubBridge::with_device("8a3c", true));
    let (_dir, state) = temp_state(Arc::clone(&bridge));
    server::start_server(&state).await.unwrap();
    let mut states = state.watcher().subscribe();

    // WHEN: Starting background work twice
    state.start_background().await;
    state.start_background().await;

    // THEN: The first pass reports Ready
    let first = timeout(Duration::from_secs(5), states.recv())
        .await
        .expect("watcher should emit")
        .unwrap();
    assert_eq!(first, DeviceState::Ready);

    // WHEN: Shutting down
    state.shutdown().await;

    // THEN: Everything is stopped
    assert!(state.watcher().is_stopped());
    assert!(!server::is_server_started(&state).await);
}

/// **VALUE**: Shutdown lets a running install finish instead of killing adb mid-push.
///
/// **WHY THIS MATTERS**: Bridge subprocesses are killed when their future is dropped.
/// Aborting the watcher during an install leaves the device half-written.
///
/// **BUG THIS CATCHES**: Would catch `shutdown` aborting the watcher task rather than
/// draining the in-flight pass.
#[tokio::test]
async fn given_install_in_flight_when_shutting_down_then_install_completes() {
    // GIVEN: Auto-install on, and a slow install already running
    let bridge = Arc::new(StubBridge::with_device("8a3c", false));
    bridge.set_install_delay(Duration::from_millis(300));
    let (_dir, state) = temp_state(Arc::clone(&bridge));
    settings::set_storage_value(&state, "installAutomatically", json!(true))
        .await
        .unwrap();
    let mut states = state.watcher().subscribe();
    state.start_background().await;

    let installing = timeout(Duration::from_secs(5), states.recv())
        .await
        .expect("watcher should emit")
        .unwrap();
    assert_eq!(installing, DeviceState::Installing);
    while bridge.install_count() == 0 {
        sleep(Duration::from_millis(10)).await;
    }

    // WHEN: Shutting down mid-install
    state.shutdown().await;

    // THEN: The install ran to completion and nothing was published afterwards
    assert_eq!(bridge.completed_install_count(), 1);
    assert_eq!(state.watcher().current().await, Some(DeviceState::Installing));
}
