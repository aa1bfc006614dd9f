use crate::APP_DIR_NAME;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "host.json";
const CONFIG_VERSION: u32 = 1;
const MIN_AUTH_TIMEOUT_MS: u64 = 100;
const MIN_POLL_INTERVAL_MS: u64 = 250;
const MIN_COMMAND_TIMEOUT_MS: u64 = 1_000;

pub const PLATFORM_TOOLS_BASE_URL: &str = "https://dl.google.com/android/repository/";
pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/";

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocketConfig {
    #[serde(default = "default_socket_port")]
    pub port: u16,
    #[serde(default = "default_auth_timeout_ms")]
    pub auth_timeout_ms: u64,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            port: default_socket_port(),
            auth_timeout_ms: default_auth_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatcherConfig {
    #[serde(default = "default_watch_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_watch_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Explicit adb executable; skips the PATH probe and the download fallback.
    pub adb_path: Option<PathBuf>,
    #[serde(default = "default_allow_download")]
    pub allow_download: bool,
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// Local copy of the companion web app pushed on install.
    pub webapp_dir: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            adb_path: None,
            allow_download: default_allow_download(),
            download_base_url: default_download_base_url(),
            command_timeout_ms: default_command_timeout_ms(),
            webapp_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackConfig {
    #[serde(default = "default_playback_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_playback_interval_ms(),
            api_base_url: default_api_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub socket: SocketConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            socket: SocketConfig::default(),
            watcher: WatcherConfig::default(),
            bridge: BridgeConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_socket_port() -> u16 {
    crate::DEVICE_SOCKET_PORT
}
fn default_auth_timeout_ms() -> u64 {
    5_000
}
fn default_watch_interval_ms() -> u64 {
    5_000
}
fn default_allow_download() -> bool {
    true
}
fn default_download_base_url() -> String {
    PLATFORM_TOOLS_BASE_URL.to_string()
}
fn default_command_timeout_ms() -> u64 {
    30_000
}
fn default_playback_interval_ms() -> u64 {
    1_000
}
fn default_api_base_url() -> String {
    SPOTIFY_API_BASE_URL.to_string()
}

/// `{platform data dir}/glancething`, the home of every persisted file.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| ConfigError::DirectoryNotFound {
            location: ErrorLocation::from(Location::caller()),
        })
}

/// Atomic JSON write shared by every file-backed store in the crate.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|e| ConfigError::SerializeError {
        location: ErrorLocation::from(Location::caller()),
        reason: e.to_string(),
    })?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
        location: ErrorLocation::from(Location::caller()),
        path: temp_path.clone(),
        source: e,
    })?;

    std::fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
        location: ErrorLocation::from(Location::caller()),
        path: path.to_path_buf(),
        source: e,
    })
}

// ============================================
// IMPLEMENTATION
// ============================================

impl HostConfig {
    /// Load config from {data_dir}/host.json.
    ///
    /// A missing file yields defaults. A file that exists but cannot be read,
    /// parsed, or validated is an error.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Host config not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read host config: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: HostConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse host config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Host config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {data_dir}/host.json (temp file + rename).
    pub fn save(&self, data_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        write_json_atomic(&config_path, self)?;

        info!("Host config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.socket.auth_timeout_ms < MIN_AUTH_TIMEOUT_MS {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid auth timeout: {}ms (minimum {MIN_AUTH_TIMEOUT_MS}ms)",
                    self.socket.auth_timeout_ms
                ),
            });
        }

        if self.watcher.poll_interval_ms < MIN_POLL_INTERVAL_MS
            || self.playback.poll_interval_ms < MIN_POLL_INTERVAL_MS
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Poll intervals must be at least {MIN_POLL_INTERVAL_MS}ms"),
            });
        }

        if self.bridge.command_timeout_ms < MIN_COMMAND_TIMEOUT_MS {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid bridge timeout: {}ms (minimum {MIN_COMMAND_TIMEOUT_MS}ms)",
                    self.bridge.command_timeout_ms
                ),
            });
        }

        for (name, url) in [
            ("download_base_url", &self.bridge.download_base_url),
            ("api_base_url", &self.playback.api_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Invalid URL format for {name}: {url}"),
                });
            }
        }

        if let Some(ref path) = self.bridge.adb_path
            && path.as_os_str().is_empty()
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "adb_path cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.socket.auth_timeout_ms)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watcher.poll_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.bridge.command_timeout_ms)
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback.poll_interval_ms)
    }
}
