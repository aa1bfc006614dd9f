// Unit tests for adb command construction

use crate::bridge::{AdbOutput, build_adb_command};

use std::ffi::OsStr;
use std::path::Path;

/// **VALUE**: Verifies device-scoped commands put `-s <serial>` before the subcommand.
///
/// **WHY THIS MATTERS**: adb only honours `-s` as a global option; placed after the
/// subcommand it is passed to the device shell and the wrong device may be targeted.
#[test]
fn given_serial_when_build_adb_command_called_then_serial_flag_precedes_args() {
    // GIVEN: A serial and a shell command
    let exe = Path::new("/opt/adb");

    // WHEN: Building the command
    let cmd = build_adb_command(exe, Some("8551Z04E"), ["shell", "echo hi"]);

    // THEN: Program and argument order are as adb expects
    let std_cmd = cmd.as_std();
    assert_eq!(std_cmd.get_program(), OsStr::new("/opt/adb"));
    let args: Vec<&OsStr> = std_cmd.get_args().collect();
    assert_eq!(args, vec!["-s", "8551Z04E", "shell", "echo hi"]);
}

#[test]
fn given_no_serial_when_build_adb_command_called_then_only_args_are_passed() {
    // GIVEN / WHEN: A device-independent command
    let cmd = build_adb_command(Path::new("adb"), None, ["devices", "-l"]);

    // THEN: No serial flag
    let args: Vec<&OsStr> = cmd.as_std().get_args().collect();
    assert_eq!(args, vec!["devices", "-l"]);
}

/// **VALUE**: Verifies error text prefers stderr and falls back to stdout.
///
/// **BUG THIS CATCHES**: adb prints "error: device not found" on stderr but some shell
/// failures only on stdout; an empty failure message makes logs useless.
#[test]
fn given_adb_output_when_failure_text_called_then_prefers_stderr() {
    // GIVEN: Output with and without stderr
    let with_stderr = AdbOutput {
        success: false,
        stdout: "ignored".to_string(),
        stderr: "error: device '1234' not found\n".to_string(),
    };
    let stdout_only = AdbOutput {
        success: false,
        stdout: "  mount: permission denied \n".to_string(),
        stderr: String::new(),
    };

    // WHEN / THEN
    assert_eq!(with_stderr.failure_text(), "error: device '1234' not found");
    assert_eq!(stdout_only.failure_text(), "mount: permission denied");
}
