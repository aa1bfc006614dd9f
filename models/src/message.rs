//! JSON messages exchanged with the device over the forwarded socket.
//!
//! Every frame is `{"type": <kind>, "data": <payload>}`, which maps onto
//! serde's adjacently tagged representation.

use crate::{DeviceState, PlaybackStatus, Shortcut};

use serde::{Deserialize, Serialize};

/// Client → server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Handshake carrying the connection secret.
    Auth(String),

    /// Ask for the current shortcut set.
    Shortcuts,

    ShortcutAdd {
        #[serde(default)]
        id: Option<String>,
        command: String,
    },

    ShortcutUpdate { id: String, command: String },

    ShortcutRemove { id: String },

    /// Launch the shortcut's command on the host.
    ShortcutRun { id: String },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Auth(_) => "auth",
            ClientMessage::Shortcuts => "shortcuts",
            ClientMessage::ShortcutAdd { .. } => "shortcut_add",
            ClientMessage::ShortcutUpdate { .. } => "shortcut_update",
            ClientMessage::ShortcutRemove { .. } => "shortcut_remove",
            ClientMessage::ShortcutRun { .. } => "shortcut_run",
        }
    }
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Auth(AuthAck),
    Shortcuts(Vec<Shortcut>),
    DeviceState(DeviceState),
    Playback(Option<PlaybackStatus>),
    Error(ErrorPayload),
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Auth(_) => "auth",
            ServerMessage::Shortcuts(_) => "shortcuts",
            ServerMessage::DeviceState(_) => "device_state",
            ServerMessage::Playback(_) => "playback",
            ServerMessage::Error(_) => "error",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthAck {
    pub success: bool,
}

/// Reply to a request that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub request: String,
    pub message: String,
}
