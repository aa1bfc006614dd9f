use super::core_failure;
use crate::error::GlanceError;
use crate::state::AppState;

use log::debug;
use serde_json::Value;

/// Stored value for `key`, `None` when unset. The socket secret is never
/// returned here.
pub async fn get_storage_value(state: &AppState, key: &str) -> Option<Value> {
    state.settings().get_value(key).await
}

/// Persist `value` under `key`. `null` removes the entry.
pub async fn set_storage_value(
    state: &AppState,
    key: &str,
    value: Value,
) -> Result<(), GlanceError> {
    debug!("Setting storage value {key}");

    state
        .settings()
        .set_value(key, value)
        .await
        .map_err(|e| core_failure("Failed to set storage value", e))
}

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Debug builds always count as dev mode; release builds follow the
/// `devMode` setting.
pub async fn is_dev_mode(state: &AppState) -> bool {
    cfg!(debug_assertions) || state.settings().dev_mode().await
}
