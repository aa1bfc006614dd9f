use crate::error::model_error::ModelError;
use crate::{ErrorLocation, NEW_SHORTCUT_ID, Shortcut};

use std::panic::Location;
use std::path::PathBuf;

/// Builder for validated [`Shortcut`] values.
///
/// Ids come from the caller (the UI generates UUIDs); the builder only
/// guarantees they are usable as registry keys and image file names.
#[derive(Debug, Default)]
pub struct ShortcutBuilder {
    id: Option<String>,
    command: Option<String>,
    image_path: Option<PathBuf>,
}

impl ShortcutBuilder {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    #[track_caller]
    pub fn build(self) -> Result<Shortcut, ModelError> {
        let id = self.id.ok_or_else(|| ModelError::Validation {
            message: String::from("Shortcut id is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if id.trim().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Shortcut id cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if id == NEW_SHORTCUT_ID {
            return Err(ModelError::Validation {
                message: format!("Shortcut id '{NEW_SHORTCUT_ID}' is reserved"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // Ids double as image file names.
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ModelError::Validation {
                message: format!("Shortcut id contains invalid characters: {id}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let command = self.command.ok_or_else(|| ModelError::Validation {
            message: String::from("Shortcut command is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if command.trim().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Shortcut command cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Shortcut {
            id,
            command,
            image_path: self.image_path,
        })
    }
}
