use common::ErrorLocation;

use std::error::Error as StdError;

use thiserror::Error as ThisError;

/// Failures while driving the `adb` bridge executable.
#[derive(Debug, ThisError)]
pub enum BridgeError {
    #[error("Bridge Unavailable Error: {message} {location}")]
    Unavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Download Error: {message} {location}")]
    DownloadFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Extract Error: {message} {location}")]
    ExtractFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bridge Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Device Communication Error: {message} {location}")]
    DeviceCommunication {
        message: String,
        location: ErrorLocation,
    },

    #[error("Install Error: {reason} {location}")]
    InstallFailed {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Forward Error: {message} {location}")]
    ForwardFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl BridgeError {
    /// Errors that mean the device went away mid-operation.
    pub fn is_device_gone(&self) -> bool {
        matches!(
            self,
            BridgeError::DeviceCommunication { .. } | BridgeError::ForwardFailed { .. }
        )
    }
}
