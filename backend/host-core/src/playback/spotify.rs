use super::PlaybackSource;
use crate::error::playback::PlaybackError;

use common::{ErrorLocation, HttpStatusCode, RedactedSecret};

use models::PlaybackStatus;

use std::panic::Location;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_secs(10);
const CURRENTLY_PLAYING_ENDPOINT: &str = "v1/me/player/currently-playing";
/// Width the device's cover art is rendered at.
pub const COVER_TARGET_WIDTH: u32 = 300;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CoverImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    #[serde(default)]
    progress_ms: Option<u64>,
    item: Option<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    name: String,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<Artist>,
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    name: String,
    #[serde(default)]
    images: Vec<CoverImage>,
}

/// Smallest cover at least `width` wide, else the first one listed.
pub fn closest_cover(covers: &[CoverImage], width: u32) -> Option<&CoverImage> {
    covers
        .iter()
        .filter(|cover| cover.width.is_some_and(|w| w >= width))
        .min_by_key(|cover| cover.width)
        .or_else(|| covers.first())
}

/// Now-playing state from the Spotify Web API.
#[derive(Clone)]
pub struct SpotifyPlaybackSource {
    base_url: Url,
    client: Client,
    access_token: RedactedSecret,
}

impl SpotifyPlaybackSource {
    pub fn new(base_url_str: &str, access_token: RedactedSecret) -> Result<Self, PlaybackError> {
        let base_url = Url::parse(base_url_str)?;
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT_DURATION)
            .build()?;

        Ok(Self {
            base_url,
            client,
            access_token,
        })
    }
}

#[async_trait]
impl PlaybackSource for SpotifyPlaybackSource {
    async fn current(&self) -> Result<Option<PlaybackStatus>, PlaybackError> {
        let url = self.base_url.join(CURRENTLY_PLAYING_ENDPOINT)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.access_token.expose())
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(PlaybackError::Status {
                status: HttpStatusCode::from(response.status().as_u16()),
                message: response.text().await.unwrap_or_default(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let body = response.text().await?;
        let playing: CurrentlyPlaying = serde_json::from_str(&body)?;

        let Some(track) = playing.item else {
            return Ok(None);
        };

        let (album, cover_url) = match track.album {
            Some(album) => {
                let cover = closest_cover(&album.images, COVER_TARGET_WIDTH).map(|c| c.url.clone());
                (album.name, cover)
            }
            None => (String::new(), None),
        };

        Ok(Some(PlaybackStatus {
            is_playing: playing.is_playing,
            track: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album,
            cover_url,
            progress_ms: playing.progress_ms.unwrap_or_default(),
            duration_ms: track.duration_ms,
        }))
    }
}
