use glancething::commands::{server, settings};
use glancething::error::GlanceError;
use glancething::logger;
use glancething::state::AppState;

use common::ErrorLocation;

use host_core::bridge::{BridgeOptions, locate_executable};
use host_core::config::{HostConfig, default_data_dir};
use host_core::error::CoreError;

use std::panic::Location;

use log::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), GlanceError> {
    let data_dir = default_data_dir().map_err(CoreError::from)?;
    std::fs::create_dir_all(&data_dir).map_err(|e| GlanceError::Glance {
        message: format!("Failed to create {}: {e}", data_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    logger::initialize(&data_dir)?;
    info!("GlanceThing v{} starting", settings::get_version());

    let config = HostConfig::load(&data_dir).map_err(|e| {
        error!("Failed to load host config: {e}");
        CoreError::from(e)
    })?;

    let state = AppState::initialize(&data_dir, config)?;

    match locate_executable(&BridgeOptions::from_config(state.config(), &data_dir)).await {
        Ok(path) => info!("Using adb at {}", path.display()),
        Err(e) => warn!("adb is not available yet: {e}"),
    }

    if state.settings().setup_complete().await {
        server::start_server(&state).await?;
    } else {
        info!("Setup not complete, socket server not started");
    }

    state.start_background().await;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }

    state.shutdown().await;
    info!("GlanceThing stopped");
    Ok(())
}
