//! Settings state management using actor pattern.
//!
//! Mutations are sent over an mpsc channel and applied one at a time by a
//! dedicated task; reads go straight to the shared `RwLock`. A mutation is
//! written to disk before memory so a failed write leaves both unchanged.

use super::{SOCKET_PASSWORD_KEY, Settings};
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::spawn as TokioSpawn;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};

type Reply = oneshot::Sender<Result<(), ConfigError>>;

/// Commands that mutate settings.
#[derive(Debug)]
pub enum SettingsCommand {
    SetValue {
        key: String,
        value: Value,
        reply: Reply,
    },
    SetSocketPassword {
        password: String,
        reply: Reply,
    },
}

/// Thread-safe handle to the persisted settings. Cheap to clone.
#[derive(Clone)]
pub struct SettingsState {
    /// Channel to the writer actor, created lazily.
    command_tx: Arc<Mutex<Option<mpsc::Sender<SettingsCommand>>>>,
    /// In-memory copy, updated only after a successful save.
    settings: Arc<RwLock<Settings>>,
    /// Directory holding `config.json`.
    data_dir: Arc<PathBuf>,
    actor_init: Arc<Mutex<bool>>,
}

impl SettingsState {
    /// Wrap already-loaded settings.
    ///
    /// # Arguments
    /// * `data_dir` - Directory `config.json` is written to
    /// * `settings` - Values loaded at startup (defaults if none were saved)
    pub fn new(data_dir: PathBuf, settings: Settings) -> Self {
        Self {
            command_tx: Arc::new(Mutex::new(None)),
            settings: Arc::new(RwLock::new(settings)),
            data_dir: Arc::new(data_dir),
            actor_init: Arc::new(Mutex::new(false)),
        }
    }

    /// Current settings snapshot.
    pub async fn snapshot(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Value for a UI-visible key. The socket password is never handed out here.
    pub async fn get_value(&self, key: &str) -> Option<Value> {
        if key == SOCKET_PASSWORD_KEY {
            debug!("Refusing plain read of {SOCKET_PASSWORD_KEY}");
            return None;
        }
        self.settings.read().await.value(key)
    }

    pub async fn set_value(&self, key: &str, value: Value) -> Result<(), ConfigError> {
        if key == SOCKET_PASSWORD_KEY {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("'{SOCKET_PASSWORD_KEY}' is managed by the credential store"),
            });
        }

        let (reply, rx) = oneshot::channel();
        self.send(SettingsCommand::SetValue {
            key: key.to_string(),
            value,
            reply,
        })
        .await?;
        Self::await_reply(rx).await
    }

    pub(crate) async fn set_socket_password(&self, password: String) -> Result<(), ConfigError> {
        let (reply, rx) = oneshot::channel();
        self.send(SettingsCommand::SetSocketPassword { password, reply })
            .await?;
        Self::await_reply(rx).await
    }

    pub async fn install_automatically(&self) -> bool {
        self.settings.read().await.install_automatically
    }

    pub async fn disable_socket_auth(&self) -> bool {
        self.settings.read().await.disable_socket_auth
    }

    pub async fn setup_complete(&self) -> bool {
        self.settings.read().await.setup_complete
    }

    pub async fn dev_mode(&self) -> bool {
        self.settings.read().await.dev_mode
    }

    async fn send(&self, cmd: SettingsCommand) -> Result<(), ConfigError> {
        self.ensure_actor().await;

        let tx_guard = self.command_tx.lock().await;
        let tx = tx_guard
            .as_ref()
            .ok_or_else(|| ConfigError::ActorUnavailable {
                location: ErrorLocation::from(Location::caller()),
                reason: "Settings actor not initialized".to_string(),
            })?;

        tx.send(cmd)
            .await
            .map_err(|e| ConfigError::ActorUnavailable {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Settings actor died: {e}"),
            })
    }

    async fn await_reply(rx: oneshot::Receiver<Result<(), ConfigError>>) -> Result<(), ConfigError> {
        rx.await.map_err(|e| ConfigError::ActorUnavailable {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Settings actor dropped reply: {e}"),
        })?
    }

    async fn ensure_actor(&self) {
        let mut init_guard = self.actor_init.lock().await;
        if !*init_guard {
            let (tx, rx) = mpsc::channel(100);

            let mut tx_guard = self.command_tx.lock().await;
            *tx_guard = Some(tx);
            drop(tx_guard);

            TokioSpawn(settings_actor(
                rx,
                Arc::clone(&self.settings),
                Arc::clone(&self.data_dir),
            ));

            *init_guard = true;
            info!("Settings actor spawned");
        }
    }
}

async fn settings_actor(
    mut command_rx: mpsc::Receiver<SettingsCommand>,
    settings: Arc<RwLock<Settings>>,
    data_dir: Arc<PathBuf>,
) {
    while let Some(cmd) = command_rx.recv().await {
        let (next, reply) = {
            let current = settings.read().await;
            match cmd {
                SettingsCommand::SetValue { key, value, reply } => {
                    debug!("Setting '{key}'");
                    (current.with_value(&key, value), reply)
                }
                SettingsCommand::SetSocketPassword { password, reply } => {
                    let mut next = current.clone();
                    next.socket_password = Some(password);
                    (Ok(next), reply)
                }
            }
        };

        let result = match next {
            Ok(next) => match next.save(&data_dir) {
                Ok(()) => {
                    *settings.write().await = next;
                    Ok(())
                }
                Err(e) => {
                    warn!("Settings write failed, keeping previous values: {e}");
                    Err(e)
                }
            },
            Err(e) => Err(e),
        };

        let _ = reply.send(result);
    }

    warn!("Settings actor stopped");
}
