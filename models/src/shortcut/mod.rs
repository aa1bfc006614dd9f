//! User-defined command shortcuts shown on the device.

pub mod builder;

use serde::{Deserialize, Serialize};

use std::path::PathBuf;

/// Most shortcuts the device grid can show.
pub const MAX_SHORTCUTS: usize = 8;

/// Image slot used while a shortcut is being composed but not yet added.
pub const NEW_SHORTCUT_ID: &str = "new";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortcut {
    pub id: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
}

impl Shortcut {
    pub fn has_image(&self) -> bool {
        self.image_path.is_some()
    }
}
