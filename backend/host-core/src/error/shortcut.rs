use common::ErrorLocation;

use models::ModelError;

use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ShortcutError {
    #[error("Capacity Error: registry already holds {max} shortcuts {location}")]
    CapacityExceeded { max: usize, location: ErrorLocation },

    #[error("Not Found Error: no shortcut with id '{id}' {location}")]
    NotFound { id: String, location: ErrorLocation },

    #[error("Duplicate Error: shortcut id '{id}' already exists {location}")]
    DuplicateId { id: String, location: ErrorLocation },

    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },

    #[error("Shortcut Storage Error: {path}: {message} {location}")]
    Storage {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Launch Error: {message} {location}")]
    Launch {
        message: String,
        location: ErrorLocation,
    },

    #[error("Shortcut Actor Error: {message} {location}")]
    ActorUnavailable {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ModelError> for ShortcutError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        let message = match error {
            ModelError::Validation { message, .. } => message,
        };
        ShortcutError::Validation {
            message,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
