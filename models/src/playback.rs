use serde::{Deserialize, Serialize};

/// What the device's now-playing widget shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub is_playing: bool,
    pub track: String,
    pub artists: Vec<String>,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub progress_ms: u64,
    pub duration_ms: u64,
}
