use super::{core_failure, first_device};
use crate::error::GlanceError;
use crate::state::AppState;

use host_core::watcher::ForwardTarget;

use std::net::SocketAddr;

use log::{debug, info};

/// Start the device socket server. Starting it twice is not an error; the
/// running listener's address is returned.
pub async fn start_server(state: &AppState) -> Result<SocketAddr, GlanceError> {
    let address = state
        .server()
        .start()
        .await
        .map_err(|e| core_failure("Failed to start socket server", e))?;

    info!("Socket server listening on {address}");
    Ok(address)
}

/// Stop the server and drop every connection.
pub async fn stop_server(state: &AppState) {
    state.server().stop().await;
    info!("Socket server stopped");
}

pub async fn is_server_started(state: &AppState) -> bool {
    state.server().is_started().await
}

/// Reverse-forward the device socket port to the running server, or to the
/// configured port when the server is not up yet.
pub async fn forward_socket_server(state: &AppState) -> Result<(), GlanceError> {
    let handle = first_device(state).await?;

    let local_port = state.server().local_port().await;

    debug!("Forwarding socket server to {handle} on port {local_port}");
    state
        .bridge()
        .forward_port(&handle, local_port)
        .await
        .map_err(|e| core_failure("Failed to forward socket server", e))?;

    info!("Socket server forwarded to {handle}");
    Ok(())
}
