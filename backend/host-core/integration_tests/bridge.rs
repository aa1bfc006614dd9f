// Exercises AdbBridge against a shell script standing in for adb.
#![cfg(unix)]

use crate::helpers::temp_credentials;

use host_core::bridge::{AdbBridge, Bridge, BridgeOptions, locate_executable};
use host_core::error::BridgeError;
use host_core::settings::Settings;

use models::DeviceHandle;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

const SERIAL: &str = "FAKE123";

/// Writes a fake adb that logs its arguments and tracks the install marker.
fn fake_adb(dir: &Path, devices_delay_secs: u32) -> PathBuf {
    let log = dir.join("adb.log");
    let state = dir.join("device-state");
    std::fs::create_dir_all(&state).unwrap();

    let script = format!(
        r#"#!/bin/sh
echo "$*" >> "{log}"
case "$*" in
  "devices -l")
    sleep {devices_delay_secs}
    echo "List of devices attached"
    echo "{SERIAL}  device usb:1-1 product:superbird model:Superbird device:superbird"
    ;;
  "-s {SERIAL} shell [ -f "*)
    if [ -f "{state}/installed" ]; then echo present; else echo missing; fi
    ;;
  "-s {SERIAL} shell touch "*)
    touch "{state}/installed"
    ;;
  "-s {SERIAL} shell rm -rf "*)
    rm -f "{state}/installed"
    ;;
  "-s {SERIAL} "*)
    ;;
  *)
    echo "error: device not found" >&2
    exit 1
    ;;
esac
"#,
        log = log.display(),
        state = state.display(),
    );

    let path = dir.join("adb");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn adb_log(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("adb.log")).unwrap_or_default()
}

struct Fixture {
    bridge: AdbBridge,
    tools: TempDir,
    _data: TempDir,
}

fn fixture(devices_delay_secs: u32, timeout: Duration, with_webapp: bool) -> Fixture {
    let tools = TempDir::new().unwrap();
    let adb = fake_adb(tools.path(), devices_delay_secs);
    let webapp = tools.path().join("webapp");
    std::fs::create_dir_all(&webapp).unwrap();
    std::fs::write(webapp.join("index.html"), "<html></html>").unwrap();

    let (data, _settings, credentials) = temp_credentials(Settings::default());
    let options = BridgeOptions {
        adb_path: Some(adb),
        allow_download: false,
        download_base_url: "http://127.0.0.1:9/".to_string(),
        data_dir: data.path().to_path_buf(),
        command_timeout: timeout,
        webapp_dir: with_webapp.then_some(webapp),
    };

    Fixture {
        bridge: AdbBridge::new(options, credentials),
        tools,
        _data: data,
    }
}

/// **VALUE**: Verifies enumeration, install, and re-install against adb's CLI shape.
///
/// **WHY THIS MATTERS**: Install must be a full replacement; repeating it on an
/// installed device must end in the same state, not a duplicated or broken one.
#[tokio::test]
async fn given_fake_device_when_installed_twice_then_installed_both_times() {
    // GIVEN: A device without the app
    let fx = fixture(0, Duration::from_secs(10), true);
    let devices = fx.bridge.list_devices().await.unwrap();
    assert_eq!(devices, vec![DeviceHandle::new(SERIAL)]);
    let handle = &devices[0];
    assert!(!fx.bridge.is_app_installed(handle).await.unwrap());

    // WHEN: Installing twice
    fx.bridge.install_app(handle).await.unwrap();
    fx.bridge.install_app(handle).await.unwrap();

    // THEN: Installed, and the password file was pushed each time
    assert!(fx.bridge.is_app_installed(handle).await.unwrap());
    let log = adb_log(fx.tools.path());
    let password_pushes = log
        .lines()
        .filter(|line| line.contains(" push ") && line.contains("ws-password"))
        .count();
    assert_eq!(password_pushes, 2);
    assert!(log.contains("shell mount -o remount,rw /"));
}

#[tokio::test]
async fn given_device_when_forwarding_then_reverse_maps_device_port_to_local_port() {
    // GIVEN: A device
    let fx = fixture(0, Duration::from_secs(10), true);
    let handle = DeviceHandle::new(SERIAL);

    // WHEN: Forwarding
    fx.bridge.forward_port(&handle, 4567).await.unwrap();

    // THEN: adb reverse was called with the device socket port
    assert!(adb_log(fx.tools.path()).contains(&format!("-s {SERIAL} reverse tcp:1337 tcp:4567")));
}

/// **VALUE**: Verifies a stale handle surfaces as the documented error kinds.
#[tokio::test]
async fn given_stale_handle_when_checked_or_forwarded_then_typed_errors() {
    // GIVEN: A handle for a device that is gone
    let fx = fixture(0, Duration::from_secs(10), true);
    let stale = DeviceHandle::new("GONE");

    // WHEN
    let check = fx.bridge.is_app_installed(&stale).await;
    let forward = fx.bridge.forward_port(&stale, 4567).await;

    // THEN
    assert!(matches!(check, Err(BridgeError::DeviceCommunication { .. })));
    assert!(matches!(forward, Err(BridgeError::ForwardFailed { .. })));
}

#[tokio::test]
async fn given_no_webapp_bundle_when_installing_then_install_failed() {
    // GIVEN: No bundle configured
    let fx = fixture(0, Duration::from_secs(10), false);

    // WHEN
    let result = fx.bridge.install_app(&DeviceHandle::new(SERIAL)).await;

    // THEN
    assert!(matches!(result, Err(BridgeError::InstallFailed { .. })));
}

/// **VALUE**: Verifies a hung adb is killed at the command timeout.
///
/// **BUG THIS CATCHES**: Would catch a missing timeout that freezes the watcher forever
/// when adb hangs on a half-enumerated USB device.
#[tokio::test]
async fn given_hanging_adb_when_listing_then_timeout() {
    // GIVEN: `devices -l` sleeps far longer than the limit
    let fx = fixture(30, Duration::from_millis(300), true);

    // WHEN
    let started = std::time::Instant::now();
    let result = fx.bridge.list_devices().await;

    // THEN: Timeout, promptly
    assert!(matches!(result, Err(BridgeError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn given_missing_explicit_path_when_locating_then_unavailable() {
    // GIVEN: An explicit path that does not exist
    let dir = TempDir::new().unwrap();
    let options = BridgeOptions {
        adb_path: Some(dir.path().join("no-such-adb")),
        allow_download: false,
        download_base_url: "http://127.0.0.1:9/".to_string(),
        data_dir: dir.path().to_path_buf(),
        command_timeout: Duration::from_secs(1),
        webapp_dir: None,
    };

    // WHEN / THEN
    assert!(matches!(
        locate_executable(&options).await,
        Err(BridgeError::Unavailable { .. })
    ));
}
