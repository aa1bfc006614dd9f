use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// A secret was asked to leave the process through an implicit path.
#[derive(Debug, ThisError)]
pub enum SecretError {
    #[error("Secret Exposure Error: {message} {location}")]
    ImplicitExposure {
        message: String,
        location: ErrorLocation,
    },
}
