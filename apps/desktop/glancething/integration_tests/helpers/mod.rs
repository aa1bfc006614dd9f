pub mod stub_bridge;

use glancething::state::AppState;

use host_core::bridge::Bridge;
use host_core::config::HostConfig;

use std::sync::Arc;

use tempfile::TempDir;

pub use stub_bridge::StubBridge;

/// Host wired against `bridge` in a fresh data directory, with the socket
/// server on an ephemeral port.
pub fn temp_state(bridge: Arc<StubBridge>) -> (TempDir, AppState) {
    let dir = TempDir::new().unwrap();
    let mut config = HostConfig::default();
    config.socket.port = 0;

    let state = AppState::with_bridge(dir.path(), config, bridge as Arc<dyn Bridge>).unwrap();
    (dir, state)
}
