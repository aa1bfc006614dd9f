//! Machine-readable classification of [`CoreError`](super::CoreError).

use super::CoreError;
use super::bridge::BridgeError;
use super::config::ConfigError;
use super::shortcut::ShortcutError;
use super::socket::SocketError;

use serde::Serialize;

/// What went wrong, without the human text. Serialized as
/// `{"kind": "<snake_case>", ...}` so callers can branch on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoreErrorKind {
    BridgeUnavailable,
    DownloadFailed,
    ExtractFailed,
    BridgeTimeout,
    DeviceCommunication,
    InstallFailed { reason: String },
    ForwardFailed,
    BridgeSpawn,
    CapacityExceeded { max: usize },
    ShortcutNotFound { id: String },
    DuplicateShortcut { id: String },
    InvalidShortcut,
    ShortcutStorage,
    LaunchFailed,
    /// A socket failure other than authentication.
    Socket,
    AuthFailed,
    Config,
    Playback,
    /// An actor task is gone; the host needs a restart.
    Unavailable,
}

impl CoreError {
    pub fn kind(&self) -> CoreErrorKind {
        match self {
            CoreError::Bridge(e) => e.kind(),
            CoreError::Shortcut(e) => e.kind(),
            CoreError::Socket(SocketError::AuthFailed { .. }) => CoreErrorKind::AuthFailed,
            CoreError::Socket(_) => CoreErrorKind::Socket,
            CoreError::Config(ConfigError::ActorUnavailable { .. }) => CoreErrorKind::Unavailable,
            CoreError::Config(_) => CoreErrorKind::Config,
            CoreError::Playback(_) => CoreErrorKind::Playback,
        }
    }
}

impl BridgeError {
    pub fn kind(&self) -> CoreErrorKind {
        match self {
            BridgeError::Unavailable { .. } => CoreErrorKind::BridgeUnavailable,
            BridgeError::DownloadFailed { .. } => CoreErrorKind::DownloadFailed,
            BridgeError::ExtractFailed { .. } => CoreErrorKind::ExtractFailed,
            BridgeError::Timeout { .. } => CoreErrorKind::BridgeTimeout,
            BridgeError::DeviceCommunication { .. } => CoreErrorKind::DeviceCommunication,
            BridgeError::InstallFailed { reason, .. } => CoreErrorKind::InstallFailed {
                reason: reason.clone(),
            },
            BridgeError::ForwardFailed { .. } => CoreErrorKind::ForwardFailed,
            BridgeError::Spawn { .. } => CoreErrorKind::BridgeSpawn,
        }
    }
}

impl ShortcutError {
    pub fn kind(&self) -> CoreErrorKind {
        match self {
            ShortcutError::CapacityExceeded { max, .. } => {
                CoreErrorKind::CapacityExceeded { max: *max }
            }
            ShortcutError::NotFound { id, .. } => CoreErrorKind::ShortcutNotFound { id: id.clone() },
            ShortcutError::DuplicateId { id, .. } => {
                CoreErrorKind::DuplicateShortcut { id: id.clone() }
            }
            ShortcutError::Validation { .. } => CoreErrorKind::InvalidShortcut,
            ShortcutError::Storage { .. } => CoreErrorKind::ShortcutStorage,
            ShortcutError::Launch { .. } => CoreErrorKind::LaunchFailed,
            ShortcutError::ActorUnavailable { .. } => CoreErrorKind::Unavailable,
        }
    }
}
