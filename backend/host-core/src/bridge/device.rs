//! Parsing `adb devices -l` output.

use models::DeviceHandle;

use std::sync::OnceLock;

use regex::Regex;

const DEVICE_LINE_PATTERN: &str = r"^(?P<serial>\S+)\s+(?P<state>\S+)(?P<details>.*)$";
const CAPTURE_SERIAL: &str = "serial";
const CAPTURE_STATE: &str = "state";
const CAPTURE_DETAILS: &str = "details";
const READY_STATE: &str = "device";
const ACCESSORY_SIGNATURE: &str = "superbird";
const LIST_HEADER: &str = "List of devices";

static DEVICE_LINE_REGEX: OnceLock<Regex> = OnceLock::new();

fn device_line_regex() -> &'static Regex {
    DEVICE_LINE_REGEX.get_or_init(|| Regex::new(DEVICE_LINE_PATTERN).expect("valid regex pattern"))
}

/// Handles of attached accessories that adb reports as usable.
///
/// Lines in `unauthorized`/`offline` state and devices without the accessory
/// signature are skipped.
pub(crate) fn parse_devices(output: &str) -> Vec<DeviceHandle> {
    let re = device_line_regex();

    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(LIST_HEADER) && !line.starts_with('*'))
        .filter_map(|line| re.captures(line))
        .filter(|cap| {
            cap.name(CAPTURE_STATE)
                .is_some_and(|state| state.as_str() == READY_STATE)
        })
        .filter(|cap| {
            cap.name(CAPTURE_DETAILS)
                .is_some_and(|details| details.as_str().to_ascii_lowercase().contains(ACCESSORY_SIGNATURE))
        })
        .filter_map(|cap| cap.name(CAPTURE_SERIAL).map(|s| DeviceHandle::new(s.as_str())))
        .collect()
}
