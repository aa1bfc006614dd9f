//! Locating (or acquiring) the adb executable.
//!
//! Resolution order: the configured path, `adb` on PATH, then a previously
//! downloaded copy under the data directory, then a fresh download of the
//! pinned platform-tools archive. Only successful resolutions are memoized.

use super::BridgeOptions;
use super::command::run_adb;
use crate::ADB_BINARY;
use crate::error::bridge::BridgeError;

use common::{ErrorLocation, HttpStatusCode};

use std::io::Cursor;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use const_format::concatcp;
use log::{debug, info, trace, warn};
use tokio::sync::OnceCell;
use tokio::task::spawn_blocking;
use tokio::time::sleep as TokioSleep;
use zip::ZipArchive;

const VERSION_ARG: &str = "version";
const PLATFORM_TOOLS_VERSION: &str = "35.0.2";
const PLATFORM_TOOLS_DIR: &str = "platform-tools";
const DOWNLOAD_MAX_ELAPSED: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(target_os = "windows")]
const PLATFORM_OS: &str = "windows";
#[cfg(target_os = "macos")]
const PLATFORM_OS: &str = "darwin";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const PLATFORM_OS: &str = "linux";

pub const PLATFORM_TOOLS_ARCHIVE: &str =
    concatcp!("platform-tools_r", PLATFORM_TOOLS_VERSION, "-", PLATFORM_OS, ".zip");

static RESOLVED: OnceCell<PathBuf> = OnceCell::const_new();

/// Resolve a usable adb executable.
///
/// # Errors
///
/// - [`BridgeError::Unavailable`] when nothing is found and downloading is off
/// - [`BridgeError::DownloadFailed`] / [`BridgeError::ExtractFailed`] from the fallback
pub async fn locate_executable(options: &BridgeOptions) -> Result<PathBuf, BridgeError> {
    if let Some(explicit) = &options.adb_path {
        return check_explicit(explicit).await;
    }

    RESOLVED
        .get_or_try_init(|| resolve(options))
        .await
        .cloned()
}

async fn check_explicit(path: &Path) -> Result<PathBuf, BridgeError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(path.to_path_buf()),
        _ => Err(BridgeError::Unavailable {
            message: format!("Configured adb path {} is not a file", path.display()),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

async fn resolve(options: &BridgeOptions) -> Result<PathBuf, BridgeError> {
    let system = PathBuf::from(ADB_BINARY);
    match run_adb(&system, None, [VERSION_ARG], PROBE_TIMEOUT).await {
        Ok(output) if output.success => {
            info!("Using system {ADB_BINARY}");
            return Ok(system);
        }
        Ok(output) => debug!("System adb probe failed: {}", output.failure_text()),
        Err(e) => debug!("System adb unavailable: {e}"),
    }

    if !options.allow_download {
        return Err(BridgeError::Unavailable {
            message: format!("{ADB_BINARY} not found on PATH and download fallback is disabled"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    acquire_platform_tools(&options.download_base_url, &options.data_dir).await
}

pub(crate) fn downloaded_executable(data_dir: &Path) -> PathBuf {
    data_dir.join(PLATFORM_TOOLS_DIR).join(ADB_BINARY)
}

/// Reuse or download+extract platform-tools into `data_dir`.
pub(crate) async fn acquire_platform_tools(
    base_url: &str,
    data_dir: &Path,
) -> Result<PathBuf, BridgeError> {
    let exe = downloaded_executable(data_dir);
    if tokio::fs::try_exists(&exe).await.unwrap_or(false) {
        info!("Using downloaded adb at {}", exe.display());
        return Ok(exe);
    }

    let url = format!("{}{PLATFORM_TOOLS_ARCHIVE}", with_trailing_slash(base_url));
    info!("Downloading platform-tools from {url}");
    let bytes = download_with_retry(&url).await?;

    let target = data_dir.to_path_buf();
    spawn_blocking(move || extract_archive(bytes, &target))
        .await
        .map_err(|e| BridgeError::ExtractFailed {
            message: format!("Extraction task failed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })??;

    if !tokio::fs::try_exists(&exe).await.unwrap_or(false) {
        return Err(BridgeError::ExtractFailed {
            message: format!("Archive did not contain {PLATFORM_TOOLS_DIR}/{ADB_BINARY}"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    make_executable(&exe)?;
    info!("Downloaded adb to {}", exe.display());
    Ok(exe)
}

fn with_trailing_slash(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

async fn download_with_retry(url: &str) -> Result<Vec<u8>, BridgeError> {
    let client = reqwest::Client::new();
    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(DOWNLOAD_MAX_ELAPSED),
        ..Default::default()
    };

    loop {
        let failure = match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                return response
                    .bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(|e| BridgeError::DownloadFailed {
                        message: format!("Failed to read archive body: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
            }
            Ok(response) => {
                let status = HttpStatusCode::from(response.status().as_u16());
                if !status.is_transient() {
                    return Err(BridgeError::DownloadFailed {
                        message: format!("Download returned HTTP {status}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                format!("HTTP {status}")
            }
            Err(e) => e.to_string(),
        };

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Download attempt failed ({failure}), retrying after {duration:?}");
                TokioSleep(duration).await;
            }
            None => {
                return Err(BridgeError::DownloadFailed {
                    message: format!("Giving up on {url}: {failure}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }
}

fn extract_archive(bytes: Vec<u8>, target: &Path) -> Result<(), BridgeError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| BridgeError::ExtractFailed {
            message: format!("Invalid platform-tools archive: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    archive
        .extract(target)
        .map_err(|e| BridgeError::ExtractFailed {
            message: format!("Failed to extract into {}: {e}", target.display()),
            location: ErrorLocation::from(Location::caller()),
        })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), BridgeError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|e| BridgeError::ExtractFailed {
            message: format!("Cannot stat {}: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        })?
        .permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms).map_err(|e| {
        warn!("chmod failed on {}: {e}", path.display());
        BridgeError::ExtractFailed {
            message: format!("Cannot mark {} executable: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), BridgeError> {
    Ok(())
}
