//! Device bridge over the external `adb` executable.
//!
//! [`Bridge`] is the seam the watcher and the app layer talk to; [`AdbBridge`]
//! is the production implementation. Every adb invocation is a bounded
//! subprocess (see [`BridgeOptions::command_timeout`]).

mod command;
mod device;
mod executable;

pub use command::AdbOutput;
pub use executable::{PLATFORM_TOOLS_ARCHIVE, locate_executable};

pub(crate) use command::{build_adb_command, run_adb};
pub(crate) use device::parse_devices;
pub(crate) use executable::{acquire_platform_tools, downloaded_executable};

use crate::DEVICE_SOCKET_PORT;
use crate::config::HostConfig;
use crate::credentials::CredentialStore;
use crate::error::bridge::BridgeError;

use common::ErrorLocation;

use models::DeviceHandle;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

const DEVICE_WEBAPP_DIR: &str = "/usr/share/qt-superbird-app/webapp";
const DEVICE_MARKER_FILE: &str = "/usr/share/qt-superbird-app/webapp/.glancething";
const DEVICE_PASSWORD_FILE: &str = "/usr/share/qt-superbird-app/webapp/ws-password";
const LOCAL_PASSWORD_STAGING: &str = "ws-password";
const MARKER_PRESENT: &str = "present";

/// Operations the host needs from a device bridge.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Attached, ready accessories. An empty list is not an error.
    async fn list_devices(&self) -> Result<Vec<DeviceHandle>, BridgeError>;

    async fn is_app_installed(&self, handle: &DeviceHandle) -> Result<bool, BridgeError>;

    /// Full replacement install; safe to repeat.
    async fn install_app(&self, handle: &DeviceHandle) -> Result<(), BridgeError>;

    /// Reverse-forward the device's socket port to `local_port` on the host.
    async fn forward_port(&self, handle: &DeviceHandle, local_port: u16) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub adb_path: Option<PathBuf>,
    pub allow_download: bool,
    pub download_base_url: String,
    pub data_dir: PathBuf,
    pub command_timeout: Duration,
    pub webapp_dir: Option<PathBuf>,
}

impl BridgeOptions {
    pub fn from_config(config: &HostConfig, data_dir: &Path) -> Self {
        Self {
            adb_path: config.bridge.adb_path.clone(),
            allow_download: config.bridge.allow_download,
            download_base_url: config.bridge.download_base_url.clone(),
            data_dir: data_dir.to_path_buf(),
            command_timeout: config.command_timeout(),
            webapp_dir: config.bridge.webapp_dir.clone(),
        }
    }
}

pub struct AdbBridge {
    options: BridgeOptions,
    credentials: CredentialStore,
}

impl AdbBridge {
    pub fn new(options: BridgeOptions, credentials: CredentialStore) -> Self {
        Self {
            options,
            credentials,
        }
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Runs adb against one device and requires a zero exit status.
    async fn device_command(
        &self,
        handle: &DeviceHandle,
        args: &[&str],
    ) -> Result<AdbOutput, BridgeError> {
        let exe = locate_executable(&self.options).await?;
        let output = run_adb(
            &exe,
            Some(handle.serial()),
            args,
            self.options.command_timeout,
        )
        .await?;

        if !output.success {
            return Err(BridgeError::DeviceCommunication {
                message: format!(
                    "adb {} on {} failed: {}",
                    args.join(" "),
                    handle.serial(),
                    output.failure_text()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(output)
    }

    async fn install_steps(&self, handle: &DeviceHandle) -> Result<(), BridgeError> {
        let webapp_dir = self
            .options
            .webapp_dir
            .as_deref()
            .ok_or_else(|| install_failed("No webapp bundle configured"))?;

        if !tokio::fs::try_exists(webapp_dir).await.unwrap_or(false) {
            return Err(install_failed(format!(
                "Webapp bundle {} does not exist",
                webapp_dir.display()
            )));
        }

        let local_webapp = webapp_dir.to_string_lossy().into_owned();

        self.device_command(handle, &["shell", "mount -o remount,rw /"])
            .await?;
        self.device_command(handle, &["shell", &format!("rm -rf {DEVICE_WEBAPP_DIR}")])
            .await?;
        self.device_command(handle, &["push", &local_webapp, DEVICE_WEBAPP_DIR])
            .await?;

        let secret = self
            .credentials
            .get_secret()
            .await
            .map_err(|e| install_failed(format!("Socket secret unavailable: {e}")))?;
        let staging = self.options.data_dir.join(LOCAL_PASSWORD_STAGING);
        tokio::fs::create_dir_all(&self.options.data_dir)
            .await
            .map_err(|e| install_failed(format!("Cannot create data dir: {e}")))?;
        tokio::fs::write(&staging, secret.expose())
            .await
            .map_err(|e| install_failed(format!("Cannot stage ws-password: {e}")))?;
        let staged = staging.to_string_lossy().into_owned();
        let pushed = self
            .device_command(handle, &["push", &staged, DEVICE_PASSWORD_FILE])
            .await;
        let _ = tokio::fs::remove_file(&staging).await;
        pushed?;

        self.device_command(handle, &["shell", &format!("touch {DEVICE_MARKER_FILE}")])
            .await?;

        if let Err(e) = self
            .device_command(handle, &["shell", "supervisorctl restart chromium"])
            .await
        {
            warn!("Installed app but browser restart failed: {e}");
        }

        Ok(())
    }
}

#[track_caller]
fn install_failed(reason: impl Into<String>) -> BridgeError {
    BridgeError::InstallFailed {
        reason: reason.into(),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[async_trait]
impl Bridge for AdbBridge {
    async fn list_devices(&self) -> Result<Vec<DeviceHandle>, BridgeError> {
        let exe = locate_executable(&self.options).await?;
        let output = run_adb(&exe, None, ["devices", "-l"], self.options.command_timeout).await?;

        if !output.success {
            return Err(BridgeError::DeviceCommunication {
                message: format!("adb devices failed: {}", output.failure_text()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let devices = parse_devices(&output.stdout);
        debug!("Found {} accessory device(s)", devices.len());
        Ok(devices)
    }

    async fn is_app_installed(&self, handle: &DeviceHandle) -> Result<bool, BridgeError> {
        let check = format!("[ -f {DEVICE_MARKER_FILE} ] && echo {MARKER_PRESENT} || echo missing");
        let output = self.device_command(handle, &["shell", &check]).await?;
        Ok(output.stdout.trim() == MARKER_PRESENT)
    }

    async fn install_app(&self, handle: &DeviceHandle) -> Result<(), BridgeError> {
        info!("Installing companion app on {}", handle.serial());

        match self.install_steps(handle).await {
            Ok(()) => {
                info!("Companion app installed on {}", handle.serial());
                Ok(())
            }
            Err(e @ BridgeError::InstallFailed { .. }) => Err(e),
            Err(e @ BridgeError::Unavailable { .. }) => Err(e),
            Err(e) => Err(install_failed(e.to_string())),
        }
    }

    async fn forward_port(&self, handle: &DeviceHandle, local_port: u16) -> Result<(), BridgeError> {
        let device = format!("tcp:{DEVICE_SOCKET_PORT}");
        let host = format!("tcp:{local_port}");

        self.device_command(handle, &["reverse", &device, &host])
            .await
            .map(|_| info!("Forwarded device {device} to host {host}"))
            .map_err(|e| match e {
                BridgeError::DeviceCommunication { message, location } => {
                    BridgeError::ForwardFailed { message, location }
                }
                other => other,
            })
    }
}
