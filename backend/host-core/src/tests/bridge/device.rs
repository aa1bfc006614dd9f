// Unit tests for `adb devices -l` parsing

use crate::bridge::parse_devices;

/// **VALUE**: Verifies that an attached accessory in the `device` state is reported.
///
/// **WHY THIS MATTERS**: This is the only way the watcher learns a device is plugged in.
///
/// **BUG THIS CATCHES**: Would catch a regex change that stops capturing the serial column.
#[test]
fn given_superbird_in_device_state_when_parsed_then_returns_its_serial() {
    // GIVEN: Typical `adb devices -l` output with one accessory
    let output = "List of devices attached\n\
                  8551Z04E               device usb:1-1 product:superbird model:Superbird device:superbird transport_id:3\n\n";

    // WHEN: Parsing
    let devices = parse_devices(output);

    // THEN: The accessory serial is returned
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].serial(), "8551Z04E");
}

/// **VALUE**: Ensures phones and other adb devices are not mistaken for the accessory.
///
/// **BUG THIS CATCHES**: Would catch dropping the signature filter, which would make the
/// watcher try to install the web app onto a developer's phone.
#[test]
fn given_non_accessory_devices_when_parsed_then_they_are_skipped() {
    // GIVEN: A phone and an emulator
    let output = "List of devices attached\n\
                  R58M123ABC device usb:1-2 product:beyond1 model:SM_G973F device:beyond1\n\
                  emulator-5554 device product:sdk_gphone model:sdk_gphone_x86 device:generic\n";

    // WHEN: Parsing
    let devices = parse_devices(output);

    // THEN: Nothing is returned
    assert!(devices.is_empty());
}

/// **VALUE**: Verifies unusable states (`unauthorized`, `offline`) are filtered out.
///
/// **WHY THIS MATTERS**: adb commands against such devices fail, and the watcher would
/// flap between states instead of reporting NotFound.
#[test]
fn given_unauthorized_and_offline_accessories_when_parsed_then_only_ready_one_returned() {
    // GIVEN: Three accessories in different states
    let output = "List of devices attached\n\
                  AAAA unauthorized usb:1-1 product:superbird model:Superbird\n\
                  BBBB offline usb:1-2 product:superbird model:Superbird\n\
                  CCCC device usb:1-3 product:superbird model:Superbird\n";

    // WHEN: Parsing
    let devices = parse_devices(output);

    // THEN: Only the ready one remains
    let serials: Vec<&str> = devices.iter().map(|d| d.serial()).collect();
    assert_eq!(serials, vec!["CCCC"]);
}

#[test]
fn given_daemon_startup_noise_when_parsed_then_it_is_ignored() {
    // GIVEN: Output printed while the adb server starts
    let output = "* daemon not running; starting now at tcp:5037\n\
                  * daemon started successfully\n\
                  List of devices attached\n";

    // WHEN: Parsing
    let devices = parse_devices(output);

    // THEN: Empty list, not garbage handles
    assert!(devices.is_empty());
}
