//! Request/response operations for the UI layer.
//!
//! Every command takes the shared [`AppState`](crate::state::AppState) and
//! returns a serializable [`GlanceError`](crate::error::GlanceError) on
//! failure.

pub mod device;
pub mod playback;
pub mod server;
pub mod settings;
pub mod shortcuts;

use crate::error::GlanceError;
use crate::state::AppState;

use common::ErrorLocation;

use host_core::error::CoreError;

use models::DeviceHandle;

use std::panic::Location;

use log::error;

/// Log a core failure and convert it for the caller.
#[track_caller]
pub(crate) fn core_failure(context: &str, e: impl Into<CoreError>) -> GlanceError {
    let e = e.into();
    error!("{context}: {e}");
    GlanceError::Core {
        cause: e.kind(),
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// First attached accessory, or [`GlanceError::NoDevice`].
pub(crate) async fn first_device(state: &AppState) -> Result<DeviceHandle, GlanceError> {
    let devices = state
        .bridge()
        .list_devices()
        .await
        .map_err(|e| core_failure("Failed to list devices", e))?;

    devices.into_iter().next().ok_or_else(|| GlanceError::NoDevice {
        message: "No device attached".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}
