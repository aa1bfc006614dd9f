pub mod bridge;
pub mod config;
pub mod kind;
pub mod playback;
pub mod shortcut;
pub mod socket;

pub use bridge::BridgeError;
pub use config::ConfigError;
pub use kind::CoreErrorKind;
pub use playback::PlaybackError;
pub use shortcut::ShortcutError;
pub use socket::SocketError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Bridge(#[from] bridge::BridgeError),

    #[error(transparent)]
    Socket(#[from] socket::SocketError),

    #[error(transparent)]
    Shortcut(#[from] shortcut::ShortcutError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Playback(#[from] playback::PlaybackError),
}
