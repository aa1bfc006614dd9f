use crate::error::bridge::BridgeError;

use common::ErrorLocation;

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::panic::Location;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use log::trace;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout as TokioTimeout;

const SERIAL_FLAG: &str = "-s";

/// Captured result of one adb invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdbOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl AdbOutput {
    /// Best human-readable failure text adb produced.
    pub fn failure_text(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

pub(crate) fn build_adb_command<I, S>(exe: &Path, serial: Option<&str>, args: I) -> TokioCommand
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = TokioCommand::new(exe);
    if let Some(serial) = serial {
        cmd.arg(SERIAL_FLAG).arg(serial);
    }
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Runs adb to completion, killing it if `limit` elapses first.
pub(crate) async fn run_adb<I, S>(
    exe: &Path,
    serial: Option<&str>,
    args: I,
    limit: Duration,
) -> Result<AdbOutput, BridgeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = build_adb_command(exe, serial, args);
    trace!("Running {:?}", cmd.as_std());

    let output = match TokioTimeout(limit, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) if err.kind() == ErrorKind::NotFound => {
            return Err(BridgeError::Unavailable {
                message: format!("adb executable not found at {}", exe.display()),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(Err(err)) => {
            return Err(BridgeError::Spawn {
                message: format!("Failed to run {}: {err}", exe.display()),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(err),
            });
        }
        Err(_) => {
            return Err(BridgeError::Timeout {
                message: format!("adb did not finish within {limit:?}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    Ok(AdbOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
