use crate::{ModelError, NEW_SHORTCUT_ID, ShortcutBuilder};

/// **VALUE**: Verifies a complete builder produces the shortcut unchanged.
#[test]
fn given_valid_fields_when_building_then_returns_shortcut() {
    // GIVEN: A builder with id, command and image
    let builder = ShortcutBuilder::default()
        .with_id("7f1c2a9e-0b1d-4c7e-9a55-2f1e8d6c4b3a")
        .with_command("code ~/projects")
        .with_image_path("/data/shortcuts/7f1c.png");

    // WHEN: Building
    let shortcut = builder.build().unwrap();

    // THEN: Fields are carried through
    assert_eq!(shortcut.id, "7f1c2a9e-0b1d-4c7e-9a55-2f1e8d6c4b3a");
    assert_eq!(shortcut.command, "code ~/projects");
    assert!(shortcut.has_image());
}

/// **VALUE**: Verifies the composing slot id can never be committed.
///
/// **WHY THIS MATTERS**: `new` holds the image of a shortcut that is still being edited.
/// Committing a shortcut under that id would let "discard draft" delete a real image.
///
/// **BUG THIS CATCHES**: Would catch the reserved-id check being dropped.
#[test]
fn given_reserved_id_when_building_then_returns_validation_error() {
    let result = ShortcutBuilder::default()
        .with_id(NEW_SHORTCUT_ID)
        .with_command("echo hi")
        .build();

    match result {
        Err(ModelError::Validation { message, .. }) => assert!(message.contains("reserved")),
        Ok(_) => panic!("Reserved id must be rejected"),
    }
}

/// **VALUE**: Verifies ids usable as file names only.
///
/// **WHY THIS MATTERS**: Image files are stored as `<id>.png`; a `../` id would write
/// outside the image directory.
///
/// **BUG THIS CATCHES**: Would catch the character whitelist being loosened.
#[test]
fn given_path_like_id_when_building_then_returns_validation_error() {
    for bad in ["../etc/passwd", "a/b", "with space", "dot.png"] {
        let result = ShortcutBuilder::default()
            .with_id(bad)
            .with_command("echo")
            .build();

        assert!(result.is_err(), "Id should be rejected: {bad}");
    }
}

/// **VALUE**: Verifies required fields are enforced.
#[test]
fn given_missing_or_blank_fields_when_building_then_returns_validation_error() {
    let missing_id = ShortcutBuilder::default().with_command("echo").build();
    let missing_command = ShortcutBuilder::default().with_id("abc").build();
    let blank_command = ShortcutBuilder::default()
        .with_id("abc")
        .with_command("   ")
        .build();

    match missing_id {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Shortcut id is required")
        }
        Ok(_) => panic!("Missing id must be rejected"),
    }
    assert!(missing_command.is_err());
    match blank_command {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Shortcut command cannot be empty")
        }
        Ok(_) => panic!("Blank command must be rejected"),
    }
}
