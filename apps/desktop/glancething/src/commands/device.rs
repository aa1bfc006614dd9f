use super::{core_failure, first_device};
use crate::error::GlanceError;
use crate::state::AppState;

use models::DeviceState;

use log::{debug, info};

/// Whether an accessory is attached. Bridge failures are returned, not
/// folded into `false`.
pub async fn find_device(state: &AppState) -> Result<bool, GlanceError> {
    let devices = state
        .bridge()
        .list_devices()
        .await
        .map_err(|e| core_failure("Failed to list devices", e))?;

    debug!("Found {} device(s)", devices.len());
    Ok(!devices.is_empty())
}

/// Device state for the setup flow: `not_found`, `not_installed` or `ready`.
///
/// Unlike the watcher this never installs or forwards anything. A device that
/// disappears between listing and the install check counts as not found.
pub async fn find_setup_device(state: &AppState) -> Result<DeviceState, GlanceError> {
    let devices = state
        .bridge()
        .list_devices()
        .await
        .map_err(|e| core_failure("Failed to list devices", e))?;

    let Some(handle) = devices.first() else {
        return Ok(DeviceState::NotFound);
    };

    let installed = match state.bridge().is_app_installed(handle).await {
        Ok(installed) => installed,
        Err(e) if e.is_device_gone() => {
            debug!("{handle} went away during the setup check: {e}");
            return Ok(DeviceState::NotFound);
        }
        Err(e) => return Err(core_failure("Failed to check installation", e)),
    };

    Ok(if installed {
        DeviceState::Ready
    } else {
        DeviceState::NotInstalled
    })
}

/// Install the companion app on the first attached device.
pub async fn install_app(state: &AppState) -> Result<(), GlanceError> {
    let handle = first_device(state).await?;

    info!("Installing app on {}", handle.serial());
    state
        .bridge()
        .install_app(&handle)
        .await
        .map_err(|e| core_failure("Install failed", e))?;

    info!("App installed on {}", handle.serial());
    Ok(())
}

/// Run one watcher pass now and return its result.
pub async fn trigger_device_state_update(state: &AppState) -> DeviceState {
    let result = state.watcher().trigger_now().await;
    debug!("Manual device state update: {result}");
    result
}
