use crate::helpers::fake_bridge::FakeBridge;
use crate::helpers::temp_settings;

use host_core::settings::{Settings, SettingsState};
use host_core::watcher::{DeviceWatcher, FixedPort, ForwardTarget};

use models::DeviceState;

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use async_trait::async_trait;

const LOCAL_PORT: u16 = 4455;
const SLOW_INTERVAL: Duration = Duration::from_secs(3600);

fn auto_install(enabled: bool) -> Settings {
    Settings {
        install_automatically: enabled,
        ..Default::default()
    }
}

/// Port that tests can move, like a server restarted on another port.
struct MovablePort(AtomicU16);

#[async_trait]
impl ForwardTarget for MovablePort {
    async fn local_port(&self) -> u16 {
        self.0.load(Ordering::SeqCst)
    }
}

fn watcher(bridge: &Arc<FakeBridge>, settings: SettingsState) -> DeviceWatcher {
    DeviceWatcher::new(
        bridge.clone(),
        settings,
        Arc::new(FixedPort(LOCAL_PORT)),
        SLOW_INTERVAL,
    )
}

/// **VALUE**: Verifies an empty device list is reported as NotFound.
#[tokio::test]
async fn given_no_device_when_triggered_then_not_found() {
    // GIVEN: Nothing plugged in
    let bridge = Arc::new(FakeBridge::default());
    let (_dir, settings) = temp_settings(auto_install(true));
    let watcher = watcher(&bridge, settings);

    // WHEN: Running a pass
    let state = watcher.trigger_now().await;

    // THEN: NotFound, and nothing else was attempted
    assert_eq!(state, DeviceState::NotFound);
    assert_eq!(FakeBridge::count(&bridge.install_calls), 0);
    assert_eq!(FakeBridge::count(&bridge.forward_calls), 0);
}

/// **VALUE**: Verifies the tunnel is set up exactly once per transition to Ready.
///
/// **WHY THIS MATTERS**: Re-running `adb reverse` every 5 seconds churns the device's
/// connection and can drop an in-flight socket session.
///
/// **BUG THIS CATCHES**: Would catch forwarding on every pass, or not forwarding at all.
#[tokio::test]
async fn given_installed_device_when_triggered_twice_then_ready_and_forwarded_once() {
    // GIVEN: An installed device
    let bridge = Arc::new(FakeBridge::with_device("CAR1", true));
    let (_dir, settings) = temp_settings(auto_install(false));
    let watcher = watcher(&bridge, settings);

    // WHEN: Two passes
    let first = watcher.trigger_now().await;
    let second = watcher.trigger_now().await;

    // THEN: Ready both times, one forward to the local port
    assert_eq!(first, DeviceState::Ready);
    assert_eq!(second, DeviceState::Ready);
    assert_eq!(FakeBridge::count(&bridge.forward_calls), 1);
    assert_eq!(*bridge.forwarded_ports.lock().unwrap(), vec![LOCAL_PORT]);
}

#[tokio::test]
async fn given_uninstalled_device_and_auto_install_off_when_triggered_then_not_installed() {
    // GIVEN: A device without the app and auto-install disabled
    let bridge = Arc::new(FakeBridge::with_device("CAR1", false));
    let (_dir, settings) = temp_settings(auto_install(false));
    let watcher = watcher(&bridge, settings);

    // WHEN: Running a pass
    let state = watcher.trigger_now().await;

    // THEN: NotInstalled, no install attempted
    assert_eq!(state, DeviceState::NotInstalled);
    assert_eq!(FakeBridge::count(&bridge.install_calls), 0);
}

/// **VALUE**: Verifies the auto-install path publishes Installing before Ready.
///
/// **WHY THIS MATTERS**: The UI shows progress from these events; skipping Installing
/// makes a 20 second install look like a hang.
#[tokio::test]
async fn given_auto_install_on_when_install_succeeds_then_installing_then_ready() {
    // GIVEN: A device without the app and auto-install enabled
    let bridge = Arc::new(FakeBridge::with_device("CAR1", false));
    let (_dir, settings) = temp_settings(auto_install(true));
    let watcher = watcher(&bridge, settings);
    let mut events = watcher.subscribe();

    // WHEN: Running a pass
    let state = watcher.trigger_now().await;

    // THEN: Installing then Ready were published, and the tunnel is up
    assert_eq!(state, DeviceState::Ready);
    assert_eq!(events.try_recv().unwrap(), DeviceState::Installing);
    assert_eq!(events.try_recv().unwrap(), DeviceState::Ready);
    assert_eq!(FakeBridge::count(&bridge.install_calls), 1);
    assert_eq!(FakeBridge::count(&bridge.forward_calls), 1);
}

#[tokio::test]
async fn given_auto_install_on_when_install_fails_then_not_installed_without_retry() {
    // GIVEN: Installs fail
    let bridge = Arc::new(FakeBridge::with_device("CAR1", false));
    bridge.set_fail_install(true);
    let (_dir, settings) = temp_settings(auto_install(true));
    let watcher = watcher(&bridge, settings);

    // WHEN: Running a pass
    let state = watcher.trigger_now().await;

    // THEN: NotInstalled after exactly one attempt
    assert_eq!(state, DeviceState::NotInstalled);
    assert_eq!(FakeBridge::count(&bridge.install_calls), 1);
    assert_eq!(FakeBridge::count(&bridge.forward_calls), 0);
}

/// **VALUE**: Verifies state depends only on the latest poll across unplug/replug.
///
/// **BUG THIS CATCHES**: Would catch caching the forwarded handle across a NotFound pass,
/// which would leave a replugged device without a tunnel.
#[tokio::test]
async fn given_ready_device_when_unplugged_and_replugged_then_states_follow_and_forward_again() {
    // GIVEN: A ready device
    let bridge = Arc::new(FakeBridge::with_device("CAR1", true));
    let (_dir, settings) = temp_settings(auto_install(false));
    let watcher = watcher(&bridge, settings);
    assert_eq!(watcher.trigger_now().await, DeviceState::Ready);

    // WHEN: Unplugged, then plugged back in
    bridge.unplug();
    let unplugged = watcher.trigger_now().await;
    bridge.plug("CAR1");
    let replugged = watcher.trigger_now().await;

    // THEN: NotFound then Ready, with a fresh forward
    assert_eq!(unplugged, DeviceState::NotFound);
    assert_eq!(replugged, DeviceState::Ready);
    assert_eq!(FakeBridge::count(&bridge.forward_calls), 2);
}

#[tokio::test]
async fn given_failed_forward_when_next_pass_runs_then_forward_is_retried() {
    // GIVEN: The first forward fails
    let bridge = Arc::new(FakeBridge::with_device("CAR1", true));
    bridge.set_fail_forward(true);
    let (_dir, settings) = temp_settings(auto_install(false));
    let watcher = watcher(&bridge, settings);
    assert_eq!(watcher.trigger_now().await, DeviceState::Ready);

    // WHEN: Forwarding recovers
    bridge.set_fail_forward(false);
    watcher.trigger_now().await;
    watcher.trigger_now().await;

    // THEN: One failed attempt, one successful one, then nothing
    assert_eq!(FakeBridge::count(&bridge.forward_calls), 2);
}

/// **VALUE**: Verifies bridge failures are absorbed into NotFound.
///
/// **WHY THIS MATTERS**: A missing adb must not crash the polling loop.
#[tokio::test]
async fn given_bridge_error_when_triggered_then_not_found() {
    // GIVEN: Enumeration fails
    let bridge = Arc::new(FakeBridge::with_device("CAR1", true));
    bridge.set_fail_list(true);
    let (_dir, settings) = temp_settings(auto_install(false));
    let watcher = watcher(&bridge, settings);

    // WHEN / THEN
    assert_eq!(watcher.trigger_now().await, DeviceState::NotFound);
}

/// **VALUE**: Verifies concurrent triggers coalesce into one pass.
///
/// **BUG THIS CATCHES**: Would catch overlapping passes racing on install and forward.
#[tokio::test]
async fn given_pass_in_progress_when_triggered_again_then_no_second_pass_runs() {
    // GIVEN: A slow enumeration
    let bridge = Arc::new(FakeBridge::with_device("CAR1", true));
    bridge.set_list_delay(Duration::from_millis(200));
    let (_dir, settings) = temp_settings(auto_install(false));
    let watcher = watcher(&bridge, settings);

    // WHEN: Two triggers at once
    let (first, second) = tokio::join!(watcher.trigger_now(), watcher.trigger_now());

    // THEN: Both see Ready, only one enumeration happened
    assert_eq!(first, DeviceState::Ready);
    assert_eq!(second, DeviceState::Ready);
    assert_eq!(FakeBridge::count(&bridge.list_calls), 1);
}

#[tokio::test]
async fn given_started_watcher_when_first_tick_fires_then_state_is_published() {
    // GIVEN: A running loop with a short interval
    let bridge = Arc::new(FakeBridge::with_device("CAR1", true));
    let (_dir, settings) = temp_settings(auto_install(false));
    let watcher = DeviceWatcher::new(
        bridge.clone(),
        settings,
        Arc::new(FixedPort(LOCAL_PORT)),
        Duration::from_millis(50),
    );
    let mut events = watcher.subscribe();

    // WHEN: Started
    let handle = watcher.start();

    // THEN: Ready arrives without any manual trigger
    let state = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state, DeviceState::Ready);

    watcher.stop();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

/// **VALUE**: Verifies nothing is published after stop.
#[tokio::test]
async fn given_stopped_watcher_when_pass_completes_then_no_event_is_emitted() {
    // GIVEN: A stopped watcher
    let bridge = Arc::new(FakeBridge::with_device("CAR1", true));
    let (_dir, settings) = temp_settings(auto_install(false));
    let watcher = watcher(&bridge, settings);
    let mut events = watcher.subscribe();
    watcher.stop();

    // WHEN: A pass runs anyway
    watcher.trigger_now().await;

    // THEN: Its result was discarded
    assert!(events.try_recv().is_err());
    assert_eq!(watcher.current().await, None);
}

/// **VALUE**: Verifies the tunnel follows the server when its port changes.
///
/// **BUG THIS CATCHES**: Would catch the watcher forwarding to a fixed config port
/// while the server listens elsewhere, or never re-forwarding after a rebind.
#[tokio::test]
async fn given_server_port_changes_when_next_pass_runs_then_forwarded_again_to_new_port() {
    // GIVEN: A Ready device forwarded to the current port
    let bridge = Arc::new(FakeBridge::with_device("CAR1", true));
    let (_dir, settings) = temp_settings(auto_install(false));
    let port = Arc::new(MovablePort(AtomicU16::new(5000)));
    let watcher = DeviceWatcher::new(
        bridge.clone(),
        settings,
        Arc::clone(&port) as Arc<dyn ForwardTarget>,
        SLOW_INTERVAL,
    );
    watcher.trigger_now().await;

    // WHEN: The port moves and another pass runs
    port.0.store(5001, Ordering::SeqCst);
    watcher.trigger_now().await;
    watcher.trigger_now().await;

    // THEN: One forward per distinct port
    assert_eq!(*bridge.forwarded_ports.lock().unwrap(), vec![5000, 5001]);
}
