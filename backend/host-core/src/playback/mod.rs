//! Now-playing relay for the device.

mod spotify;

pub use spotify::{COVER_TARGET_WIDTH, CoverImage, SpotifyPlaybackSource, closest_cover};

use crate::error::playback::PlaybackError;
use crate::socket::SocketServer;

use models::PlaybackStatus;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Something that can say what is playing right now.
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    /// `None` when nothing is playing.
    async fn current(&self) -> Result<Option<PlaybackStatus>, PlaybackError>;
}

/// Background poll that forwards playback changes to the socket server.
///
/// Dropping the poller stops it.
pub struct PlaybackPoller {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PlaybackPoller {
    pub fn start(
        source: Arc<dyn PlaybackSource>,
        server: SocketServer,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = TokioSpawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Option<PlaybackStatus>> = None;
            info!("Playback poller started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match source.current().await {
                            Ok(status) => {
                                if last.as_ref() != Some(&status) {
                                    debug!("Playback changed");
                                    server.publish_playback(status.clone()).await;
                                    last = Some(status);
                                }
                            }
                            Err(e) => warn!("Playback poll failed: {e}"),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Playback poller stopped");
        });

        Self { shutdown, task }
    }

    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PlaybackPoller {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
