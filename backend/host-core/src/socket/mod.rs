//! Device-facing WebSocket server.
//!
//! Listens on loopback only; the device reaches it through the adb reverse
//! tunnel. Every frame is a JSON [`ClientMessage`]/[`ServerMessage`].
//!
//! # Protocol
//!
//! 1. A new connection is unauthenticated (unless auth is disabled).
//! 2. It must send `{"type":"auth","data":<secret>}` within the auth window.
//!    Other messages are ignored; a wrong secret closes the connection.
//! 3. Once authenticated it receives the shortcut set and the last known
//!    device/playback state, then any broadcast.
//!
//! [`ClientMessage`]: models::ClientMessage

mod connection;
mod session;

pub use connection::MessageSink;

pub(crate) use connection::{Connection, fan_out};

use crate::SOCKET_SERVER_HOSTNAME;
use crate::config::HostConfig;
use crate::credentials::CredentialStore;
use crate::error::socket::SocketError;
use crate::shortcuts::ShortcutRegistry;
use crate::watcher::ForwardTarget;

use common::ErrorLocation;

use models::{DeviceState, PlaybackStatus, ServerMessage};

use std::collections::HashMap;
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio::spawn as TokioSpawn;
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// 0 picks a free port.
    pub port: u16,
    pub auth_timeout: Duration,
}

impl SocketOptions {
    pub fn from_config(config: &HostConfig) -> Self {
        Self {
            port: config.socket.port,
            auth_timeout: config.auth_timeout(),
        }
    }
}

struct RunningListener {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub(crate) struct ServerInner {
    pub(crate) options: SocketOptions,
    pub(crate) credentials: CredentialStore,
    pub(crate) registry: ShortcutRegistry,
    pub(crate) connections: RwLock<HashMap<Uuid, Arc<Connection>>>,
    pub(crate) device_state: RwLock<Option<DeviceState>>,
    pub(crate) playback: RwLock<Option<PlaybackStatus>>,
    listener: Mutex<Option<RunningListener>>,
}

#[derive(Clone)]
pub struct SocketServer {
    inner: Arc<ServerInner>,
}

impl SocketServer {
    pub fn new(
        options: SocketOptions,
        credentials: CredentialStore,
        registry: ShortcutRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(ServerInner {
                options,
                credentials,
                registry,
                connections: RwLock::new(HashMap::new()),
                device_state: RwLock::new(None),
                playback: RwLock::new(None),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Bind and start accepting. Calling it again while running returns the
    /// existing address.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Bind`] if the port cannot be bound.
    pub async fn start(&self) -> Result<SocketAddr, SocketError> {
        let mut listener_guard = self.inner.listener.lock().await;

        if let Some(running) = listener_guard.as_ref() {
            if !running.task.is_finished() {
                debug!("Socket server already running on {}", running.local_addr);
                return Ok(running.local_addr);
            }
            warn!("Socket server task ended unexpectedly, restarting");
        }

        let address = format!("{SOCKET_SERVER_HOSTNAME}:{}", self.inner.options.port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| SocketError::Bind {
                message: format!("Failed to bind {address}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let local_addr = listener.local_addr()?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = TokioSpawn(accept_loop(
            Arc::clone(&self.inner),
            listener,
            shutdown_rx,
        ));

        *listener_guard = Some(RunningListener {
            local_addr,
            shutdown,
            task,
        });

        info!("Socket server listening on {local_addr}");
        Ok(local_addr)
    }

    /// Close the listener and every live connection. No-op when stopped.
    pub async fn stop(&self) {
        let running = self.inner.listener.lock().await.take();
        let Some(running) = running else {
            return;
        };

        let _ = running.shutdown.send(true);
        if let Err(e) = running.task.await {
            warn!("Socket accept loop ended abnormally: {e}");
        }

        let connections: Vec<Arc<Connection>> =
            self.inner.connections.write().await.drain().map(|(_, c)| c).collect();
        for conn in &connections {
            conn.close();
        }

        info!(
            "Socket server on {} stopped ({} connection(s) closed)",
            running.local_addr,
            connections.len()
        );
    }

    pub async fn is_started(&self) -> bool {
        self.inner
            .listener
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.inner
            .listener
            .lock()
            .await
            .as_ref()
            .map(|running| running.local_addr)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.connections.read().await.len()
    }

    pub async fn authenticated_count(&self) -> usize {
        self.inner
            .connections
            .read()
            .await
            .values()
            .filter(|c| c.is_authenticated())
            .count()
    }

    /// Send to every authenticated connection; failing ones are closed.
    pub async fn broadcast(&self, message: &ServerMessage) {
        self.inner.broadcast(message).await
    }

    pub async fn broadcast_shortcuts(&self) {
        self.inner.broadcast_shortcuts().await
    }

    pub async fn publish_device_state(&self, state: DeviceState) {
        *self.inner.device_state.write().await = Some(state);
        self.inner.broadcast(&ServerMessage::DeviceState(state)).await;
    }

    pub async fn publish_playback(&self, playback: Option<PlaybackStatus>) {
        *self.inner.playback.write().await = playback.clone();
        self.inner.broadcast(&ServerMessage::Playback(playback)).await;
    }

    /// Forward watcher transitions to connected clients until the sender closes.
    pub fn relay_device_states(&self, mut states: broadcast::Receiver<DeviceState>) -> JoinHandle<()> {
        let server = self.clone();
        TokioSpawn(async move {
            loop {
                match states.recv().await {
                    Ok(state) => server.publish_device_state(state).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Device state relay lagged by {skipped}");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Forward to the bound port while running, the configured port otherwise.
#[async_trait]
impl ForwardTarget for SocketServer {
    async fn local_port(&self) -> u16 {
        match self.local_addr().await {
            Some(address) => address.port(),
            None => self.inner.options.port,
        }
    }
}

impl ServerInner {
    async fn broadcast(&self, message: &ServerMessage) {
        let frame = match message.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode '{}' broadcast: {e}", message.kind());
                return;
            }
        };

        let sinks: Vec<Arc<dyn MessageSink>> = self
            .connections
            .read()
            .await
            .values()
            .map(|c| Arc::clone(c) as Arc<dyn MessageSink>)
            .collect();

        let failed = fan_out(&sinks, &frame);
        if failed.is_empty() {
            return;
        }

        let mut connections = self.connections.write().await;
        for id in failed {
            if let Some(conn) = connections.remove(&id) {
                warn!("Dropping connection {id} after failed delivery");
                conn.close();
            }
        }
    }

    pub(crate) async fn broadcast_shortcuts(&self) {
        let shortcuts = self.registry.list().await;
        self.broadcast(&ServerMessage::Shortcuts(shortcuts)).await;
    }
}

async fn accept_loop(
    inner: Arc<ServerInner>,
    listener: TcpListener,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let inner = Arc::clone(&inner);
                    let shutdown = shutdown.clone();
                    TokioSpawn(async move {
                        if let Err(e) = session::serve_connection(inner, stream, peer, shutdown).await {
                            warn!("Session with {peer} ended with error: {e}");
                        }
                    });
                }
                Err(e) => warn!("Accept failed: {e}"),
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
