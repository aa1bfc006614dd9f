pub mod bridge;
pub mod config;
pub mod credentials;
pub mod error;
pub mod playback;
pub mod settings;
pub mod shortcuts;
pub mod socket;
pub mod watcher;

#[cfg(test)]
mod tests;

#[cfg(windows)]
pub const ADB_BINARY: &str = "adb.exe";
#[cfg(not(windows))]
pub const ADB_BINARY: &str = "adb";

/// Port the companion app dials on the device side of the reverse tunnel.
pub const DEVICE_SOCKET_PORT: u16 = 1337;
pub const SOCKET_SERVER_HOSTNAME: &str = "127.0.0.1";
pub const APP_DIR_NAME: &str = "glancething";
