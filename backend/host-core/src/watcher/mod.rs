//! Periodic device-state detection.
//!
//! Polling is the source of truth: every pass re-enumerates devices and
//! classifies the first one from scratch. At most one pass runs at a time;
//! a trigger that arrives mid-pass waits for that pass and reports its result.

use crate::bridge::Bridge;
use crate::settings::SettingsState;

use models::{DeviceHandle, DeviceState};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

const STATE_CHANNEL_CAPACITY: usize = 32;

/// Host port that the device's socket port is reverse-forwarded to.
///
/// Asked on every Ready pass, so a server that rebinds is picked up.
#[async_trait]
pub trait ForwardTarget: Send + Sync {
    async fn local_port(&self) -> u16;
}

/// A port known up front.
#[derive(Debug, Clone, Copy)]
pub struct FixedPort(pub u16);

#[async_trait]
impl ForwardTarget for FixedPort {
    async fn local_port(&self) -> u16 {
        self.0
    }
}

#[derive(Default)]
struct PassState {
    /// Handle and host port of the reverse tunnel believed to be up.
    forwarded: Option<(DeviceHandle, u16)>,
}

struct WatcherInner {
    /// Device operations; every pass goes through it.
    bridge: Arc<dyn Bridge>,

    /// Read for `installAutomatically` on each pass.
    settings: SettingsState,

    /// Where Ready devices get forwarded to.
    forward_target: Arc<dyn ForwardTarget>,

    poll_interval: Duration,

    /// Held for the duration of a pass; `try_lock` failing means a pass is running.
    pass: Mutex<PassState>,

    /// Last published state, `None` before the first pass.
    current: RwLock<Option<DeviceState>>,

    /// Fan-out of state changes to observers.
    events: broadcast::Sender<DeviceState>,

    /// Set by `stop`; suppresses publication from a pass still in flight.
    stopped: AtomicBool,

    /// Wakes the polling loop so it can exit.
    shutdown: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct DeviceWatcher {
    inner: Arc<WatcherInner>,
}

impl DeviceWatcher {
    /// Build an idle watcher. Nothing runs until [`DeviceWatcher::start`].
    ///
    /// # Arguments
    /// * `bridge` - Device bridge the passes run against
    /// * `settings` - Read each pass for `installAutomatically`
    /// * `forward_target` - Supplies the host port the device is forwarded to
    /// * `poll_interval` - Delay between passes when nothing triggers one early
    pub fn new(
        bridge: Arc<dyn Bridge>,
        settings: SettingsState,
        forward_target: Arc<dyn ForwardTarget>,
        poll_interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(WatcherInner {
                bridge,
                settings,
                forward_target,
                poll_interval,
                pass: Mutex::new(PassState::default()),
                current: RwLock::new(None),
                events,
                stopped: AtomicBool::new(false),
                shutdown,
            }),
        }
    }

    /// Receiver for state transitions. Only changes are sent.
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceState> {
        self.inner.events.subscribe()
    }

    /// Last published state, `None` before the first pass.
    pub async fn current(&self) -> Option<DeviceState> {
        *self.inner.current.read().await
    }

    /// Spawn the polling loop. The first pass runs immediately.
    pub fn start(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut shutdown = inner.shutdown.subscribe();

        TokioSpawn(async move {
            let mut ticker = interval(inner.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Device watcher started ({:?} interval)", inner.poll_interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if inner.stopped.load(Ordering::SeqCst) {
                            break;
                        }
                        match inner.pass.try_lock() {
                            Ok(mut pass) => {
                                inner.run_pass(&mut pass).await;
                            }
                            Err(_) => debug!("Previous pass still running, skipping tick"),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Device watcher stopped");
        })
    }

    /// Run one pass now, or join the one already running.
    pub async fn trigger_now(&self) -> DeviceState {
        match self.inner.pass.try_lock() {
            Ok(mut pass) => self.inner.run_pass(&mut pass).await,
            Err(_) => {
                debug!("Pass in progress, coalescing trigger");
                let _pass = self.inner.pass.lock().await;
                self.current().await.unwrap_or(DeviceState::NotFound)
            }
        }
    }

    /// Stop the loop. A pass already running completes but publishes nothing.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let _ = self.inner.shutdown.send(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }
}

impl WatcherInner {
    async fn run_pass(&self, pass: &mut PassState) -> DeviceState {
        let state = self.evaluate(pass).await;

        if state != DeviceState::Ready {
            pass.forwarded = None;
        }

        self.publish(state).await;
        state
    }

    async fn evaluate(&self, pass: &mut PassState) -> DeviceState {
        let devices = match self.bridge.list_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Device enumeration failed: {e}");
                return DeviceState::NotFound;
            }
        };

        let Some(handle) = devices.into_iter().next() else {
            return DeviceState::NotFound;
        };

        match self.bridge.is_app_installed(&handle).await {
            Ok(true) => {}
            Ok(false) => {
                if !self.settings.install_automatically().await {
                    return DeviceState::NotInstalled;
                }
                if !self.install(&handle).await {
                    return DeviceState::NotInstalled;
                }
            }
            Err(e) => {
                warn!("Install check failed for {}: {e}", handle.serial());
                return DeviceState::NotFound;
            }
        }

        self.publish(DeviceState::Ready).await;
        self.ensure_forwarded(pass, handle).await;
        DeviceState::Ready
    }

    /// Auto-install then re-check; `true` when the device ends up installed.
    async fn install(&self, handle: &DeviceHandle) -> bool {
        self.publish(DeviceState::Installing).await;

        if let Err(e) = self.bridge.install_app(handle).await {
            warn!("Automatic install on {} failed: {e}", handle.serial());
            return false;
        }

        match self.bridge.is_app_installed(handle).await {
            Ok(installed) => installed,
            Err(e) => {
                warn!("Post-install check failed for {}: {e}", handle.serial());
                false
            }
        }
    }

    async fn ensure_forwarded(&self, pass: &mut PassState, handle: DeviceHandle) {
        let local_port = self.forward_target.local_port().await;
        if pass
            .forwarded
            .as_ref()
            .is_some_and(|(forwarded, port)| *forwarded == handle && *port == local_port)
        {
            return;
        }

        match self.bridge.forward_port(&handle, local_port).await {
            Ok(()) => pass.forwarded = Some((handle, local_port)),
            Err(e) if e.is_device_gone() => {
                debug!("{} went away before forwarding: {e}", handle.serial());
                pass.forwarded = None;
            }
            Err(e) => {
                warn!("Port forward to {} failed: {e}", handle.serial());
                pass.forwarded = None;
            }
        }
    }

    async fn publish(&self, state: DeviceState) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        let mut current = self.current.write().await;
        if *current == Some(state) {
            return;
        }
        *current = Some(state);
        drop(current);

        info!("Device state: {state}");
        let _ = self.events.send(state);
    }
}
