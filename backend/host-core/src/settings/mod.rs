//! Persisted user settings (`settings.json`).
//!
//! Settings are a typed view over a flat key-value document. Known keys are
//! strongly typed; unknown keys written by the UI are kept in `extra` so the
//! store round-trips everything it is given.

mod state;

pub use state::{SettingsCommand, SettingsState};

use crate::config::write_json_atomic;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::panic::Location;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SOCKET_PASSWORD_KEY: &str = "socketPassword";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub setup_complete: bool,
    #[serde(default)]
    pub install_automatically: bool,
    #[serde(default)]
    pub disable_socket_auth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_password: Option<String>,
    #[serde(default)]
    pub launch_minimized: bool,
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Settings {
    /// Load from {data_dir}/settings.json; a missing file yields defaults.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(SETTINGS_FILE_NAME);

        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            location: ErrorLocation::from(Location::caller()),
            path: path.clone(),
            source: e,
        })?;

        serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
            location: ErrorLocation::from(Location::caller()),
            path,
            reason: e.to_string(),
        })
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), ConfigError> {
        write_json_atomic(&data_dir.join(SETTINGS_FILE_NAME), self)
    }

    /// Value stored under a wire key, `None` when unset.
    pub fn value(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove(key),
            _ => None,
        }
    }

    /// Copy of these settings with `key` replaced.
    ///
    /// Known keys must keep their type: `installAutomatically = "yes"` is a
    /// validation error rather than a silently dropped value.
    pub fn with_value(&self, key: &str, value: Value) -> Result<Self, ConfigError> {
        if key.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "Settings key cannot be empty".to_string(),
            });
        }

        let mut map = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                return Err(ConfigError::SerializeError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: "Settings did not serialize to an object".to_string(),
                });
            }
        };

        if value.is_null() {
            map.remove(key);
        } else {
            map.insert(key.to_string(), value);
        }

        serde_json::from_value(Value::Object(map)).map_err(|e| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid value for '{key}': {e}"),
        })
    }
}
