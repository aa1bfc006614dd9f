use crate::helpers::socket_client::{authenticate, connect, receive_kind};
use crate::helpers::temp_credentials;

use host_core::error::PlaybackError;
use host_core::playback::{PlaybackPoller, PlaybackSource, SpotifyPlaybackSource};
use host_core::settings::Settings;
use host_core::shortcuts::ShortcutRegistry;
use host_core::socket::{SocketOptions, SocketServer};

use common::RedactedSecret;

use models::PlaybackStatus;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1/me/player/currently-playing";

fn source(server: &MockServer) -> SpotifyPlaybackSource {
    SpotifyPlaybackSource::new(&format!("{}/", server.uri()), RedactedSecret::new("token-123"))
        .unwrap()
}

/// **VALUE**: Verifies a playing track is mapped to the device's playback shape.
///
/// **BUG THIS CATCHES**: Would catch a missing bearer header, a wrong endpoint, or a
/// cover choice that ignores the target width.
#[tokio::test]
async fn given_track_playing_when_current_called_then_status_mapped() {
    // GIVEN: The API reports a playing track
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playing": true,
            "progress_ms": 42000,
            "item": {
                "name": "Song",
                "duration_ms": 180000,
                "artists": [{"name": "A"}, {"name": "B"}],
                "album": {
                    "name": "Record",
                    "images": [
                        {"url": "big", "width": 640, "height": 640},
                        {"url": "mid", "width": 300, "height": 300},
                        {"url": "tiny", "width": 64, "height": 64}
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    // WHEN: Polling
    let status = source(&server).current().await.unwrap().unwrap();

    // THEN: Mapped fields
    assert!(status.is_playing);
    assert_eq!(status.track, "Song");
    assert_eq!(status.artists, vec!["A", "B"]);
    assert_eq!(status.album, "Record");
    assert_eq!(status.cover_url.as_deref(), Some("mid"));
    assert_eq!(status.progress_ms, 42000);
    assert_eq!(status.duration_ms, 180000);
}

#[tokio::test]
async fn given_nothing_playing_when_current_called_then_none() {
    // GIVEN: 204 No Content
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    // WHEN / THEN
    assert_eq!(source(&server).current().await.unwrap(), None);
}

/// **VALUE**: Verifies auth failures surface with their status code.
///
/// **WHY THIS MATTERS**: The app must distinguish an expired token (ask the user) from a
/// transient outage (keep polling).
#[tokio::test]
async fn given_expired_token_when_current_called_then_unauthorized_status_error() {
    // GIVEN: 401
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    // WHEN
    let result = source(&server).current().await;

    // THEN
    match result {
        Err(PlaybackError::Status { status, .. }) => assert!(status.is_unauthorized()),
        other => panic!("Expected status error, got {other:?}"),
    }
}

struct FixedSource(PlaybackStatus);

#[async_trait]
impl PlaybackSource for FixedSource {
    async fn current(&self) -> Result<Option<PlaybackStatus>, PlaybackError> {
        Ok(Some(self.0.clone()))
    }
}

/// **VALUE**: Verifies the poller relays playback to authenticated clients, once per change.
#[tokio::test]
async fn given_poller_running_when_source_reports_track_then_client_receives_playback_once() {
    // GIVEN: A socket server with an authenticated client
    let (dir, _settings, credentials) = temp_credentials(Settings::default());
    let secret = credentials.get_secret().await.unwrap().expose().to_string();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    let server = SocketServer::new(
        SocketOptions {
            port: 0,
            auth_timeout: Duration::from_secs(5),
        },
        credentials,
        registry,
    );
    let addr = server.start().await.unwrap();
    let mut ws = connect(addr).await;
    authenticate(&mut ws, &secret).await;
    receive_kind(&mut ws, "shortcuts", Duration::from_secs(2)).await;

    let status = PlaybackStatus {
        is_playing: true,
        track: "Song".to_string(),
        artists: vec!["A".to_string()],
        album: "Record".to_string(),
        cover_url: None,
        progress_ms: 0,
        duration_ms: 1000,
    };

    // WHEN: The poller runs a few ticks
    let poller = PlaybackPoller::start(
        Arc::new(FixedSource(status)),
        server.clone(),
        Duration::from_millis(20),
    );
    let pushed = receive_kind(&mut ws, "playback", Duration::from_secs(2)).await;

    // THEN: The status arrived, and unchanged ticks are not re-sent
    assert_eq!(pushed["data"]["track"], "Song");
    assert!(
        tokio::time::timeout(Duration::from_millis(150), receive_kind(&mut ws, "playback", Duration::from_secs(1)))
            .await
            .is_err()
    );

    poller.stop();
    server.stop().await;
}
