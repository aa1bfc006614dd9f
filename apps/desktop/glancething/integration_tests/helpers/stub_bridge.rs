use host_core::bridge::Bridge;
use host_core::error::BridgeError;

use common::ErrorLocation;

use models::DeviceHandle;

use std::panic::Location;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

/// Bridge with one optional device and switchable failures.
#[derive(Default)]
pub struct StubBridge {
    device: Mutex<Option<DeviceHandle>>,
    installed: AtomicBool,
    fail_list: AtomicBool,
    fail_install: AtomicBool,
    lose_device_on_check: AtomicBool,
    install_delay: Mutex<Option<Duration>>,
    pub install_calls: AtomicUsize,
    pub completed_installs: AtomicUsize,
    pub forwarded_ports: Mutex<Vec<u16>>,
}

impl StubBridge {
    pub fn with_device(serial: &str, installed: bool) -> Self {
        let bridge = Self::default();
        *bridge.device.lock().unwrap() = Some(DeviceHandle::new(serial));
        bridge.installed.store(installed, Ordering::SeqCst);
        bridge
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_install(&self, fail: bool) {
        self.fail_install.store(fail, Ordering::SeqCst);
    }

    /// The install check reports the device as gone, as adb does for a stale serial.
    pub fn set_lose_device_on_check(&self, lose: bool) {
        self.lose_device_on_check.store(lose, Ordering::SeqCst);
    }

    /// Installs take `delay`, like a push of the webapp over USB.
    pub fn set_install_delay(&self, delay: Duration) {
        *self.install_delay.lock().unwrap() = Some(delay);
    }

    pub fn completed_install_count(&self) -> usize {
        self.completed_installs.load(Ordering::SeqCst)
    }

    pub fn install_count(&self) -> usize {
        self.install_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Bridge for StubBridge {
    async fn list_devices(&self) -> Result<Vec<DeviceHandle>, BridgeError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(BridgeError::Unavailable {
                message: "adb missing".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(self.device.lock().unwrap().iter().cloned().collect())
    }

    async fn is_app_installed(&self, handle: &DeviceHandle) -> Result<bool, BridgeError> {
        if self.lose_device_on_check.load(Ordering::SeqCst) {
            return Err(BridgeError::DeviceCommunication {
                message: format!("device '{}' not found", handle.serial()),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(self.installed.load(Ordering::SeqCst))
    }

    async fn install_app(&self, _handle: &DeviceHandle) -> Result<(), BridgeError> {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.install_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_install.load(Ordering::SeqCst) {
            return Err(BridgeError::InstallFailed {
                reason: "remount refused".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.installed.store(true, Ordering::SeqCst);
        self.completed_installs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn forward_port(&self, _handle: &DeviceHandle, local_port: u16) -> Result<(), BridgeError> {
        self.forwarded_ports.lock().unwrap().push(local_port);
        Ok(())
    }
}
