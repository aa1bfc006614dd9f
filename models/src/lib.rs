//! Domain models for GlanceThing.
//!
//! Pure data passed between layers:
//!
//! - **models** (this crate): device state, shortcuts, playback, wire messages
//! - **host-core**: bridge, watcher, socket server and registries operating on models
//! - **glancething**: application wiring, logging and host commands

pub mod device;
pub mod error;
pub mod message;
pub mod playback;
pub mod shortcut;

#[cfg(test)]
mod tests;

pub use common::ErrorLocation;
pub use device::{DeviceHandle, DeviceState};
pub use error::model_error::ModelError;
pub use message::{AuthAck, ClientMessage, ErrorPayload, ServerMessage};
pub use playback::PlaybackStatus;
pub use shortcut::builder::ShortcutBuilder;
pub use shortcut::{MAX_SHORTCUTS, NEW_SHORTCUT_ID, Shortcut};
