//! On-disk layout: `shortcuts.json` plus one `shortcuts/<id>.png` per image.

use crate::error::shortcut::ShortcutError;

use common::ErrorLocation;

use models::{MAX_SHORTCUTS, Shortcut};

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::warn;

pub const SHORTCUTS_FILE_NAME: &str = "shortcuts.json";
pub const SHORTCUT_IMAGES_DIR: &str = "shortcuts";
const IMAGE_EXTENSION: &str = "png";

#[derive(Debug, Clone)]
pub struct ShortcutStore {
    file: PathBuf,
    images_dir: PathBuf,
}

impl ShortcutStore {
    pub fn new(data_dir: &Path) -> Result<Self, ShortcutError> {
        let data_dir = std::path::absolute(data_dir).map_err(|e| storage_error(data_dir, e))?;
        Ok(Self {
            file: data_dir.join(SHORTCUTS_FILE_NAME),
            images_dir: data_dir.join(SHORTCUT_IMAGES_DIR),
        })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn image_file(&self, id: &str) -> PathBuf {
        self.images_dir.join(format!("{id}.{IMAGE_EXTENSION}"))
    }

    /// Existing image for `id`, if any.
    pub fn existing_image(&self, id: &str) -> Option<PathBuf> {
        let path = self.image_file(id);
        path.is_file().then_some(path)
    }

    pub fn load(&self) -> Result<Vec<Shortcut>, ShortcutError> {
        if !self.file.exists() {
            return Ok(Vec::new());
        }

        let contents =
            std::fs::read_to_string(&self.file).map_err(|e| storage_error(&self.file, e))?;
        let mut shortcuts: Vec<Shortcut> =
            serde_json::from_str(&contents).map_err(|e| storage_error(&self.file, e))?;

        if shortcuts.len() > MAX_SHORTCUTS {
            warn!(
                "{} holds {} shortcuts, keeping the first {MAX_SHORTCUTS}",
                self.file.display(),
                shortcuts.len()
            );
            shortcuts.truncate(MAX_SHORTCUTS);
        }

        // Image files are the source of truth for image paths.
        for shortcut in &mut shortcuts {
            shortcut.image_path = self.existing_image(&shortcut.id);
        }

        Ok(shortcuts)
    }

    pub fn save(&self, shortcuts: &[Shortcut]) -> Result<(), ShortcutError> {
        let json = serde_json::to_string_pretty(shortcuts)
            .map_err(|e| storage_error(&self.file, e))?;

        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }

        let temp = self.file.with_extension("json.tmp");
        std::fs::write(&temp, json).map_err(|e| storage_error(&temp, e))?;
        std::fs::rename(&temp, &self.file).map_err(|e| storage_error(&self.file, e))
    }

    pub fn ensure_images_dir(&self) -> Result<(), ShortcutError> {
        std::fs::create_dir_all(&self.images_dir).map_err(|e| storage_error(&self.images_dir, e))
    }
}

#[track_caller]
pub(crate) fn storage_error(path: &Path, error: impl std::fmt::Display) -> ShortcutError {
    ShortcutError::Storage {
        path: path.to_path_buf(),
        message: error.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
