use super::core_failure;
use crate::error::GlanceError;
use crate::state::AppState;

use common::ErrorLocation;

use models::{MAX_SHORTCUTS, NEW_SHORTCUT_ID, Shortcut, ShortcutBuilder};

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info};
use uuid::Uuid;

/// Copy `source` in as the image for `id`. Use `new` for a shortcut that
/// has not been added yet.
pub async fn upload_shortcut_image(
    state: &AppState,
    id: &str,
    source: &Path,
) -> Result<PathBuf, GlanceError> {
    let stored = state
        .registry()
        .upload_image(id, source)
        .await
        .map_err(|e| core_failure("Failed to upload shortcut image", e))?;

    debug!("Stored image for shortcut {id} at {}", stored.display());
    Ok(stored)
}

/// Discard the pending image of a shortcut that was never added.
pub async fn remove_new_shortcut_image(state: &AppState) -> Result<(), GlanceError> {
    state
        .registry()
        .remove_image(NEW_SHORTCUT_ID)
        .await
        .map_err(|e| core_failure("Failed to remove pending shortcut image", e))
}

pub async fn get_shortcuts(state: &AppState) -> Vec<Shortcut> {
    state.registry().list().await
}

/// Add a shortcut and push the new set to connected devices.
///
/// A missing id gets a fresh uuid. A pending `new` image is adopted.
pub async fn add_shortcut(
    state: &AppState,
    id: Option<String>,
    command: &str,
) -> Result<Shortcut, GlanceError> {
    if state.registry().len().await >= MAX_SHORTCUTS {
        return Err(GlanceError::Validation {
            message: format!("At most {MAX_SHORTCUTS} shortcuts are allowed"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let shortcut = ShortcutBuilder::default()
        .with_id(id.unwrap_or_else(|| Uuid::new_v4().to_string()))
        .with_command(command)
        .build()
        .map_err(|e| GlanceError::Validation {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let added = state
        .registry()
        .add(shortcut)
        .await
        .map_err(|e| core_failure("Failed to add shortcut", e))?;

    info!("Added shortcut {}", added.id);
    state.server().broadcast_shortcuts().await;
    Ok(added)
}

pub async fn update_shortcut(
    state: &AppState,
    id: &str,
    command: &str,
) -> Result<Shortcut, GlanceError> {
    let updated = state
        .registry()
        .update(id, command)
        .await
        .map_err(|e| core_failure("Failed to update shortcut", e))?;

    info!("Updated shortcut {id}");
    state.server().broadcast_shortcuts().await;
    Ok(updated)
}

pub async fn remove_shortcut(state: &AppState, id: &str) -> Result<(), GlanceError> {
    state
        .registry()
        .remove(id)
        .await
        .map_err(|e| core_failure("Failed to remove shortcut", e))?;

    info!("Removed shortcut {id}");
    state.server().broadcast_shortcuts().await;
    Ok(())
}

pub fn get_shortcut_image_path(state: &AppState, id: &str) -> Option<PathBuf> {
    state.registry().image_path(id)
}
