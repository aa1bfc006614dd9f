//! Scriptable in-memory [`Bridge`] for watcher tests.

use host_core::bridge::Bridge;
use host_core::error::BridgeError;

use common::ErrorLocation;

use models::DeviceHandle;

use std::panic::Location;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

#[derive(Default)]
pub struct FakeBridge {
    devices: Mutex<Vec<DeviceHandle>>,
    installed: AtomicBool,
    fail_list: AtomicBool,
    fail_install: AtomicBool,
    fail_forward: AtomicBool,
    list_delay: Mutex<Option<Duration>>,
    pub list_calls: AtomicUsize,
    pub install_calls: AtomicUsize,
    pub forward_calls: AtomicUsize,
    pub forwarded_ports: Mutex<Vec<u16>>,
}

impl FakeBridge {
    pub fn with_device(serial: &str, installed: bool) -> Self {
        let bridge = Self::default();
        bridge.plug(serial);
        bridge.installed.store(installed, Ordering::SeqCst);
        bridge
    }

    pub fn plug(&self, serial: &str) {
        *self.devices.lock().unwrap() = vec![DeviceHandle::new(serial)];
    }

    pub fn unplug(&self) {
        self.devices.lock().unwrap().clear();
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_install(&self, fail: bool) {
        self.fail_install.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_forward(&self, fail: bool) {
        self.fail_forward.store(fail, Ordering::SeqCst);
    }

    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Bridge for FakeBridge {
    async fn list_devices(&self) -> Result<Vec<DeviceHandle>, BridgeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(BridgeError::Unavailable {
                message: "adb missing".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn is_app_installed(&self, handle: &DeviceHandle) -> Result<bool, BridgeError> {
        if !self.devices.lock().unwrap().contains(handle) {
            return Err(BridgeError::DeviceCommunication {
                message: format!("device '{}' not found", handle.serial()),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(self.installed.load(Ordering::SeqCst))
    }

    async fn install_app(&self, _handle: &DeviceHandle) -> Result<(), BridgeError> {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_install.load(Ordering::SeqCst) {
            return Err(BridgeError::InstallFailed {
                reason: "push failed".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.installed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn forward_port(&self, _handle: &DeviceHandle, local_port: u16) -> Result<(), BridgeError> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_forward.load(Ordering::SeqCst) {
            return Err(BridgeError::ForwardFailed {
                message: "reverse failed".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.forwarded_ports.lock().unwrap().push(local_port);
        Ok(())
    }
}
