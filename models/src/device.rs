//! Device lifecycle as seen from the host.

use serde::{Deserialize, Serialize};

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Lifecycle state of the tethered device.
///
/// `NotFound` and `NotInstalled`/`Ready` are reachable from each other on any
/// poll. `Installing` only ever resolves to `Ready` or back to `NotInstalled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    NotFound,
    NotInstalled,
    Installing,
    Ready,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::NotFound => "not_found",
            DeviceState::NotInstalled => "not_installed",
            DeviceState::Installing => "installing",
            DeviceState::Ready => "ready",
        }
    }
}

impl Display for DeviceState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

/// Serial of an attached device as reported by the bridge.
///
/// Only meaningful within the discovery pass that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceHandle(String);

impl DeviceHandle {
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    pub fn serial(&self) -> &str {
        &self.0
    }
}

impl Display for DeviceHandle {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(&self.0)
    }
}
