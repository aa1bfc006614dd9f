use common::ErrorLocation;

use host_core::error::{CoreError, CoreErrorKind};

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors returned by host commands.
///
/// Serialized as `{"type": <variant>, "data": {...}}` for the UI layer, with
/// location tracking kept for logs.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum GlanceError {
    /// Error from this app
    #[error("GlanceThing Error: {message} {location}")]
    Glance {
        message: String,
        location: ErrorLocation,
    },

    /// Error from host-core operations (bridge, registry, socket, ...)
    #[error("Core Error: {message} {location}")]
    Core {
        /// Typed cause the UI can branch on
        cause: CoreErrorKind,
        message: String,
        location: ErrorLocation,
    },

    /// No accessory is attached
    #[error("No Device Error: {message} {location}")]
    NoDevice {
        message: String,
        location: ErrorLocation,
    },

    /// Request rejected before reaching the core
    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for GlanceError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        GlanceError::Core {
            cause: error.kind(),
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
