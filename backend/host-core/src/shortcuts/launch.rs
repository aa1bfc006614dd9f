use crate::error::shortcut::ShortcutError;

use common::ErrorLocation;

use std::panic::Location;
use std::process::Stdio;

use log::{debug, info, warn};
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;

#[cfg(windows)]
fn shell_command(command: &str) -> TokioCommand {
    let mut cmd = TokioCommand::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> TokioCommand {
    let mut cmd = TokioCommand::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

/// Launch a shortcut command through the platform shell without waiting for it.
pub fn launch(command: &str) -> Result<(), ShortcutError> {
    let mut child = shell_command(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ShortcutError::Launch {
            message: format!("Failed to launch '{command}': {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Launched shortcut command (PID: {:?})", child.id());

    // Reap the child so it does not linger as a zombie.
    TokioSpawn(async move {
        match child.wait().await {
            Ok(status) => debug!("Shortcut command exited with {status}"),
            Err(e) => warn!("Failed to wait on shortcut command: {e}"),
        }
    });

    Ok(())
}
