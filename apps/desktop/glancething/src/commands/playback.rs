use super::core_failure;
use crate::error::GlanceError;
use crate::state::AppState;

use common::{ErrorLocation, RedactedSecret};

use host_core::playback::{PlaybackPoller, SpotifyPlaybackSource};

use std::panic::Location;
use std::sync::Arc;

use log::info;

/// Start relaying Spotify playback with `access_token`, replacing any
/// running poller.
pub async fn set_spotify_token(state: &AppState, access_token: String) -> Result<(), GlanceError> {
    if access_token.trim().is_empty() {
        return Err(GlanceError::Validation {
            message: "Access token must not be empty".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let source = SpotifyPlaybackSource::new(
        &state.config().playback.api_base_url,
        RedactedSecret::new(access_token),
    )
    .map_err(|e| core_failure("Failed to create playback source", e))?;

    let poller = PlaybackPoller::start(
        Arc::new(source),
        state.server().clone(),
        state.config().playback_interval(),
    );
    state.replace_playback(Some(poller)).await;

    info!("Playback polling started");
    Ok(())
}

/// Stop relaying playback.
pub async fn clear_spotify_token(state: &AppState) {
    state.replace_playback(None).await;
    info!("Playback polling stopped");
}
