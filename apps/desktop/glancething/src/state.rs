use crate::error::GlanceError;

use host_core::bridge::{AdbBridge, Bridge, BridgeOptions};
use host_core::config::HostConfig;
use host_core::credentials::CredentialStore;
use host_core::error::CoreError;
use host_core::playback::PlaybackPoller;
use host_core::settings::{Settings, SettingsState};
use host_core::shortcuts::ShortcutRegistry;
use host_core::socket::{SocketOptions, SocketServer};
use host_core::watcher::{DeviceWatcher, ForwardTarget};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Upper bound on waiting for an in-flight watcher pass at shutdown. An install
/// can take several bridge calls, each bounded by the bridge timeout.
const WATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything the host commands operate on.
///
/// The components are actors or handles around shared state, so cloning
/// `AppState` is cheap and all clones observe the same host.
#[derive(Clone)]
pub struct AppState {
    data_dir: PathBuf,
    config: HostConfig,
    settings: SettingsState,
    credentials: CredentialStore,
    registry: ShortcutRegistry,
    bridge: Arc<dyn Bridge>,
    watcher: DeviceWatcher,
    server: SocketServer,
    playback: Arc<Mutex<Option<PlaybackPoller>>>,
    background: Arc<Mutex<Option<Background>>>,
}

/// Tasks started by [`AppState::start_background`].
struct Background {
    /// Polling loop; drained at shutdown so a running bridge call can finish.
    watcher: JoinHandle<()>,

    /// Watcher-to-socket relay; holds no external resources.
    relay: JoinHandle<()>,
}

impl AppState {
    /// Wire up the host against the real adb bridge.
    ///
    /// # Errors
    ///
    /// Returns an error if the shortcut registry cannot be opened.
    pub fn initialize(data_dir: &Path, config: HostConfig) -> Result<Self, GlanceError> {
        let settings = load_settings(data_dir);
        let credentials = CredentialStore::new(settings.clone());
        let bridge = Arc::new(AdbBridge::new(
            BridgeOptions::from_config(&config, data_dir),
            credentials.clone(),
        ));

        Self::assemble(data_dir, config, settings, credentials, bridge)
    }

    /// Same wiring with a caller-supplied bridge.
    ///
    /// # Errors
    ///
    /// Returns an error if the shortcut registry cannot be opened.
    pub fn with_bridge(
        data_dir: &Path,
        config: HostConfig,
        bridge: Arc<dyn Bridge>,
    ) -> Result<Self, GlanceError> {
        let settings = load_settings(data_dir);
        let credentials = CredentialStore::new(settings.clone());

        Self::assemble(data_dir, config, settings, credentials, bridge)
    }

    fn assemble(
        data_dir: &Path,
        config: HostConfig,
        settings: SettingsState,
        credentials: CredentialStore,
        bridge: Arc<dyn Bridge>,
    ) -> Result<Self, GlanceError> {
        let registry = ShortcutRegistry::open(data_dir).map_err(CoreError::from)?;
        let server = SocketServer::new(
            SocketOptions::from_config(&config),
            credentials.clone(),
            registry.clone(),
        );
        let watcher = DeviceWatcher::new(
            Arc::clone(&bridge),
            settings.clone(),
            Arc::new(server.clone()) as Arc<dyn ForwardTarget>,
            config.watch_interval(),
        );

        info!("Host state initialized in {}", data_dir.display());

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            config,
            settings,
            credentials,
            registry,
            bridge,
            watcher,
            server,
            playback: Arc::new(Mutex::new(None)),
            background: Arc::new(Mutex::new(None)),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn settings(&self) -> &SettingsState {
        &self.settings
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn registry(&self) -> &ShortcutRegistry {
        &self.registry
    }

    pub fn bridge(&self) -> &Arc<dyn Bridge> {
        &self.bridge
    }

    pub fn watcher(&self) -> &DeviceWatcher {
        &self.watcher
    }

    pub fn server(&self) -> &SocketServer {
        &self.server
    }

    /// Start the watcher loop and relay its transitions to the socket server.
    pub async fn start_background(&self) {
        let mut background = self.background.lock().await;
        if background.is_some() {
            return;
        }

        *background = Some(Background {
            relay: self.server.relay_device_states(self.watcher.subscribe()),
            watcher: self.watcher.start(),
        });
    }

    /// Swap the playback poller. `None` stops polling.
    pub async fn replace_playback(&self, poller: Option<PlaybackPoller>) {
        let mut guard = self.playback.lock().await;
        if let Some(previous) = guard.take() {
            previous.stop();
        }
        *guard = poller;
    }

    pub async fn has_playback(&self) -> bool {
        self.playback
            .lock()
            .await
            .as_ref()
            .is_some_and(|poller| !poller.is_finished())
    }

    /// Stop everything that runs in the background and close the server.
    ///
    /// A watcher pass already talking to the device is allowed to finish; its
    /// result is discarded.
    pub async fn shutdown(&self) {
        info!("Shutting down host");

        self.watcher.stop();
        self.replace_playback(None).await;

        if let Some(background) = self.background.lock().await.take() {
            match timeout(WATCHER_DRAIN_TIMEOUT, background.watcher).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Device watcher task failed: {e}"),
                Err(_) => warn!("Device watcher still busy after {WATCHER_DRAIN_TIMEOUT:?}"),
            }
            background.relay.abort();
        }

        self.server.stop().await;
    }
}

fn load_settings(data_dir: &Path) -> SettingsState {
    let settings = Settings::load(data_dir).unwrap_or_else(|e| {
        warn!("Falling back to default settings: {e}");
        Settings::default()
    });

    SettingsState::new(data_dir.to_path_buf(), settings)
}
