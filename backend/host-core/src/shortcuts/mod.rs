//! Shortcut registry using actor pattern.
//!
//! Mutations go through a single actor task which stages the change on a
//! copy, persists it on the blocking pool, and only then publishes it to the
//! shared `RwLock`. A mutation that fails leaves memory and disk as they were.

mod launch;
mod store;

pub use launch::launch;
pub use store::{SHORTCUT_IMAGES_DIR, SHORTCUTS_FILE_NAME, ShortcutStore};

use crate::error::shortcut::ShortcutError;
use store::storage_error;

use common::ErrorLocation;

use models::{MAX_SHORTCUTS, NEW_SHORTCUT_ID, Shortcut};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio::task::spawn_blocking;

type Reply<T> = oneshot::Sender<Result<T, ShortcutError>>;

#[derive(Debug)]
pub enum RegistryCommand {
    Add {
        shortcut: Shortcut,
        reply: Reply<Shortcut>,
    },
    Update {
        id: String,
        command: String,
        reply: Reply<Shortcut>,
    },
    Remove {
        id: String,
        reply: Reply<()>,
    },
    UploadImage {
        id: String,
        source: PathBuf,
        reply: Reply<PathBuf>,
    },
    RemoveImage {
        id: String,
        reply: Reply<()>,
    },
}

#[derive(Clone)]
pub struct ShortcutRegistry {
    /// Channel to the mutation actor, `None` until first use.
    command_tx: Arc<Mutex<Option<mpsc::Sender<RegistryCommand>>>>,
    /// Committed list. Readers never see a staged change.
    shortcuts: Arc<RwLock<Vec<Shortcut>>>,
    /// `shortcuts.json` plus the images directory.
    store: Arc<ShortcutStore>,
    /// Set once the actor has been spawned.
    actor_init: Arc<Mutex<bool>>,
}

impl ShortcutRegistry {
    /// Open the registry rooted at `data_dir`, loading any saved shortcuts.
    pub fn open(data_dir: &Path) -> Result<Self, ShortcutError> {
        let store = ShortcutStore::new(data_dir)?;
        let shortcuts = store.load()?;
        info!("Loaded {} shortcut(s)", shortcuts.len());

        Ok(Self {
            command_tx: Arc::new(Mutex::new(None)),
            shortcuts: Arc::new(RwLock::new(shortcuts)),
            store: Arc::new(store),
            actor_init: Arc::new(Mutex::new(false)),
        })
    }

    /// Shortcuts in insertion order.
    pub async fn list(&self) -> Vec<Shortcut> {
        self.shortcuts.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Shortcut> {
        self.shortcuts
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.shortcuts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.shortcuts.read().await.is_empty()
    }

    /// Absolute path of the image stored for `id` (including `new`), if any.
    pub fn image_path(&self, id: &str) -> Option<PathBuf> {
        if !is_valid_image_id(id) {
            return None;
        }
        self.store.existing_image(id)
    }

    pub async fn add(&self, shortcut: Shortcut) -> Result<Shortcut, ShortcutError> {
        let (reply, rx) = oneshot::channel();
        self.request(RegistryCommand::Add { shortcut, reply }, rx)
            .await
    }

    pub async fn update(&self, id: &str, command: &str) -> Result<Shortcut, ShortcutError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RegistryCommand::Update {
                id: id.to_string(),
                command: command.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn remove(&self, id: &str) -> Result<(), ShortcutError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RegistryCommand::Remove {
                id: id.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    /// Copy `source` in as the image for `id` (`new` stages one for the next add).
    pub async fn upload_image(&self, id: &str, source: &Path) -> Result<PathBuf, ShortcutError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RegistryCommand::UploadImage {
                id: id.to_string(),
                source: source.to_path_buf(),
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn remove_image(&self, id: &str) -> Result<(), ShortcutError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RegistryCommand::RemoveImage {
                id: id.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    async fn request<T>(
        &self,
        cmd: RegistryCommand,
        rx: oneshot::Receiver<Result<T, ShortcutError>>,
    ) -> Result<T, ShortcutError> {
        self.ensure_actor().await;

        {
            let tx_guard = self.command_tx.lock().await;
            let tx = tx_guard
                .as_ref()
                .ok_or_else(|| ShortcutError::ActorUnavailable {
                    message: "Shortcut actor not initialized".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            tx.send(cmd)
                .await
                .map_err(|e| ShortcutError::ActorUnavailable {
                    message: format!("Shortcut actor died: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        rx.await.map_err(|e| ShortcutError::ActorUnavailable {
            message: format!("Shortcut actor dropped reply: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?
    }

    async fn ensure_actor(&self) {
        let mut init_guard = self.actor_init.lock().await;
        if !*init_guard {
            let (tx, rx) = mpsc::channel(100);

            let mut tx_guard = self.command_tx.lock().await;
            *tx_guard = Some(tx);
            drop(tx_guard);

            TokioSpawn(registry_actor(
                rx,
                Arc::clone(&self.shortcuts),
                Arc::clone(&self.store),
            ));

            *init_guard = true;
            info!("Shortcut registry actor spawned");
        }
    }
}

/// Ids that may name an image file: a shortcut id or the pending `new` slot.
fn is_valid_image_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[track_caller]
fn not_found(id: &str) -> ShortcutError {
    ShortcutError::NotFound {
        id: id.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

async fn registry_actor(
    mut command_rx: mpsc::Receiver<RegistryCommand>,
    shortcuts: Arc<RwLock<Vec<Shortcut>>>,
    store: Arc<ShortcutStore>,
) {
    while let Some(cmd) = command_rx.recv().await {
        match cmd {
            RegistryCommand::Add { shortcut, reply } => {
                let result = commit(&shortcuts, &store, move |store, staged| {
                    apply_add(store, staged, shortcut)
                })
                .await;
                let _ = reply.send(result);
            }
            RegistryCommand::Update { id, command, reply } => {
                let result = commit(&shortcuts, &store, move |store, staged| {
                    apply_update(store, staged, &id, &command)
                })
                .await;
                let _ = reply.send(result);
            }
            RegistryCommand::Remove { id, reply } => {
                let result = commit(&shortcuts, &store, move |store, staged| {
                    apply_remove(store, staged, &id)
                })
                .await;
                let _ = reply.send(result);
            }
            RegistryCommand::UploadImage { id, source, reply } => {
                let result = commit(&shortcuts, &store, move |store, staged| {
                    apply_upload(store, staged, &id, &source)
                })
                .await;
                let _ = reply.send(result);
            }
            RegistryCommand::RemoveImage { id, reply } => {
                let result = commit(&shortcuts, &store, move |store, staged| {
                    apply_remove_image(store, staged, &id)
                })
                .await;
                let _ = reply.send(result);
            }
        }
    }

    warn!("Shortcut registry actor stopped");
}

/// Apply one mutation to a copy of the list on the blocking pool, and publish
/// the copy only if the mutation (including its disk writes) succeeded.
async fn commit<T, F>(
    shortcuts: &RwLock<Vec<Shortcut>>,
    store: &Arc<ShortcutStore>,
    apply: F,
) -> Result<T, ShortcutError>
where
    T: Send + 'static,
    F: FnOnce(&ShortcutStore, &mut Vec<Shortcut>) -> Result<T, ShortcutError> + Send + 'static,
{
    let mut staged = shortcuts.read().await.clone();
    let store = Arc::clone(store);

    let (staged, value) = spawn_blocking(move || {
        let result = apply(&store, &mut staged);
        result.map(|value| (staged, value))
    })
    .await
    .map_err(|e| ShortcutError::ActorUnavailable {
        message: format!("Shortcut storage task failed: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })??;

    *shortcuts.write().await = staged;
    Ok(value)
}

fn apply_add(
    store: &ShortcutStore,
    staged: &mut Vec<Shortcut>,
    mut shortcut: Shortcut,
) -> Result<Shortcut, ShortcutError> {
    if staged.len() >= MAX_SHORTCUTS {
        return Err(ShortcutError::CapacityExceeded {
            max: MAX_SHORTCUTS,
            location: ErrorLocation::from(Location::caller()),
        });
    }

    if staged.iter().any(|s| s.id == shortcut.id) {
        return Err(ShortcutError::DuplicateId {
            id: shortcut.id,
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let pending = store.existing_image(NEW_SHORTCUT_ID);
    let target = store.image_file(&shortcut.id);
    shortcut.image_path = match &pending {
        Some(pending) => {
            std::fs::rename(pending, &target).map_err(|e| storage_error(pending, e))?;
            debug!("Adopted pending image for {}", shortcut.id);
            Some(target.clone())
        }
        None => store.existing_image(&shortcut.id),
    };

    staged.push(shortcut.clone());

    if let Err(e) = store.save(staged) {
        if let Some(pending) = &pending
            && let Err(restore) = std::fs::rename(&target, pending)
        {
            warn!("Could not restore pending image after failed add: {restore}");
        }
        return Err(e);
    }

    info!("Added shortcut {}", shortcut.id);
    Ok(shortcut)
}

fn apply_update(
    store: &ShortcutStore,
    staged: &mut [Shortcut],
    id: &str,
    command: &str,
) -> Result<Shortcut, ShortcutError> {
    if command.trim().is_empty() {
        return Err(ShortcutError::Validation {
            message: "Shortcut command cannot be empty".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let entry = staged
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| not_found(id))?;
    entry.command = command.to_string();
    let updated = entry.clone();

    store.save(staged)?;
    info!("Updated shortcut {id}");
    Ok(updated)
}

fn apply_remove(
    store: &ShortcutStore,
    staged: &mut Vec<Shortcut>,
    id: &str,
) -> Result<(), ShortcutError> {
    let index = staged
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| not_found(id))?;
    let removed = staged.remove(index);

    store.save(staged)?;

    if let Some(image) = removed.image_path.or_else(|| store.existing_image(id))
        && let Err(e) = std::fs::remove_file(&image)
    {
        warn!("Removed shortcut {id} but not its image {}: {e}", image.display());
    }

    info!("Removed shortcut {id}");
    Ok(())
}

fn apply_upload(
    store: &ShortcutStore,
    staged: &mut [Shortcut],
    id: &str,
    source: &Path,
) -> Result<PathBuf, ShortcutError> {
    if !is_valid_image_id(id) {
        return Err(ShortcutError::Validation {
            message: format!("'{id}' cannot name a shortcut image"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let entry_index = staged.iter().position(|s| s.id == id);
    if id != NEW_SHORTCUT_ID && entry_index.is_none() {
        return Err(not_found(id));
    }

    store.ensure_images_dir()?;

    let target = store.image_file(id);
    let temp = target.with_extension("png.tmp");
    std::fs::copy(source, &temp).map_err(|e| storage_error(source, e))?;
    std::fs::rename(&temp, &target).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        storage_error(&target, e)
    })?;

    if let Some(index) = entry_index
        && staged[index].image_path.is_none()
    {
        staged[index].image_path = Some(target.clone());
        if let Err(e) = store.save(staged) {
            let _ = std::fs::remove_file(&target);
            return Err(e);
        }
    }

    debug!("Stored image for {id} at {}", target.display());
    Ok(target)
}

fn apply_remove_image(
    store: &ShortcutStore,
    staged: &mut [Shortcut],
    id: &str,
) -> Result<(), ShortcutError> {
    if !is_valid_image_id(id) {
        return Err(ShortcutError::Validation {
            message: format!("'{id}' cannot name a shortcut image"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let Some(image) = store.existing_image(id) else {
        return Ok(());
    };

    if let Some(entry) = staged.iter_mut().find(|s| s.id == id) {
        entry.image_path = None;
        store.save(staged)?;
    }

    std::fs::remove_file(&image).map_err(|e| storage_error(&image, e))
}
