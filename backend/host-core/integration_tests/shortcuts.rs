use host_core::error::ShortcutError;
use host_core::shortcuts::{SHORTCUT_IMAGES_DIR, SHORTCUTS_FILE_NAME, ShortcutRegistry};

use models::{MAX_SHORTCUTS, NEW_SHORTCUT_ID, Shortcut, ShortcutBuilder};

use std::path::Path;

use tempfile::TempDir;

fn shortcut(id: &str, command: &str) -> Shortcut {
    ShortcutBuilder::default()
        .with_id(id)
        .with_command(command)
        .build()
        .unwrap()
}

fn write_png(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\x89PNG fake").unwrap();
    path
}

/// **VALUE**: Verifies the hard cap of 8 shortcuts and that freeing a slot reopens it.
///
/// **WHY THIS MATTERS**: The device UI has exactly 8 slots; a 9th entry would be
/// unreachable or break its layout.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one in the capacity check, or a remove
/// that does not actually free the slot.
#[tokio::test]
async fn given_full_registry_when_adding_ninth_then_capacity_exceeded_until_one_removed() {
    // GIVEN: 8 shortcuts
    let dir = TempDir::new().unwrap();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    for i in 0..MAX_SHORTCUTS {
        registry
            .add(shortcut(&format!("s{i}"), "echo hi"))
            .await
            .unwrap();
    }

    // WHEN: Adding a 9th
    let result = registry.add(shortcut("extra", "echo hi")).await;

    // THEN: Rejected and nothing changed
    assert!(matches!(result, Err(ShortcutError::CapacityExceeded { .. })));
    assert_eq!(registry.len().await, MAX_SHORTCUTS);

    // WHEN: One removed and the 9th retried
    registry.remove("s3").await.unwrap();
    let retried = registry.add(shortcut("extra", "echo hi")).await;

    // THEN: Accepted and appended last
    assert!(retried.is_ok());
    let ids: Vec<String> = registry.list().await.into_iter().map(|s| s.id).collect();
    assert_eq!(ids.last().map(String::as_str), Some("extra"));
    assert!(!ids.contains(&"s3".to_string()));
}

#[tokio::test]
async fn given_existing_id_when_added_again_then_duplicate_id() {
    // GIVEN: One shortcut
    let dir = TempDir::new().unwrap();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    registry.add(shortcut("music", "spotify")).await.unwrap();

    // WHEN: Adding the same id
    let result = registry.add(shortcut("music", "other")).await;

    // THEN: Rejected, original command kept
    assert!(matches!(result, Err(ShortcutError::DuplicateId { .. })));
    assert_eq!(registry.get("music").await.unwrap().command, "spotify");
}

/// **VALUE**: Verifies update keeps the entry's position and image.
#[tokio::test]
async fn given_shortcut_with_image_when_updated_then_position_and_image_preserved() {
    // GIVEN: Three shortcuts, the middle one with an image
    let dir = TempDir::new().unwrap();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    for id in ["a", "b", "c"] {
        registry.add(shortcut(id, "true")).await.unwrap();
    }
    let source = write_png(dir.path(), "upload.png");
    registry.upload_image("b", &source).await.unwrap();

    // WHEN: Updating the middle one
    let updated = registry.update("b", "firefox").await.unwrap();

    // THEN: Same slot, same image, new command
    let list = registry.list().await;
    assert_eq!(list[1].id, "b");
    assert_eq!(list[1].command, "firefox");
    assert!(updated.has_image());
    assert_eq!(list[1].image_path, registry.image_path("b"));
}

#[tokio::test]
async fn given_missing_id_when_updated_or_removed_then_not_found_and_disk_unchanged() {
    // GIVEN: One persisted shortcut
    let dir = TempDir::new().unwrap();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    registry.add(shortcut("a", "true")).await.unwrap();
    let before = std::fs::read_to_string(dir.path().join(SHORTCUTS_FILE_NAME)).unwrap();

    // WHEN: Touching an unknown id
    let update = registry.update("ghost", "x").await;
    let remove = registry.remove("ghost").await;

    // THEN: NotFound, file untouched
    assert!(matches!(update, Err(ShortcutError::NotFound { .. })));
    assert!(matches!(remove, Err(ShortcutError::NotFound { .. })));
    let after = std::fs::read_to_string(dir.path().join(SHORTCUTS_FILE_NAME)).unwrap();
    assert_eq!(before, after);
}

/// **VALUE**: Verifies removing a shortcut deletes its image file.
///
/// **BUG THIS CATCHES**: Would catch orphaned images piling up in the data directory.
#[tokio::test]
async fn given_shortcut_with_image_when_removed_then_image_file_deleted() {
    // GIVEN: A shortcut with an image
    let dir = TempDir::new().unwrap();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    registry.add(shortcut("a", "true")).await.unwrap();
    let source = write_png(dir.path(), "upload.png");
    let stored = registry.upload_image("a", &source).await.unwrap();
    assert!(stored.is_file());

    // WHEN: Removing it
    registry.remove("a").await.unwrap();

    // THEN: The image is gone too
    assert!(!stored.exists());
    assert_eq!(registry.image_path("a"), None);
}

/// **VALUE**: Verifies an image uploaded before the shortcut exists is adopted on add.
///
/// **WHY THIS MATTERS**: The UI uploads the picture while the user is still typing the
/// command, under the placeholder id `new`.
#[tokio::test]
async fn given_pending_new_image_when_shortcut_added_then_image_is_adopted() {
    // GIVEN: An image staged under `new`
    let dir = TempDir::new().unwrap();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    let source = write_png(dir.path(), "upload.png");
    registry.upload_image(NEW_SHORTCUT_ID, &source).await.unwrap();
    assert!(registry.image_path(NEW_SHORTCUT_ID).is_some());

    // WHEN: Adding a shortcut
    let added = registry.add(shortcut("mail", "thunderbird")).await.unwrap();

    // THEN: It owns the image and the pending slot is empty
    assert_eq!(
        added.image_path,
        Some(dir.path().join(SHORTCUT_IMAGES_DIR).join("mail.png"))
    );
    assert_eq!(registry.image_path(NEW_SHORTCUT_ID), None);
}

#[tokio::test]
async fn given_pending_image_when_removed_then_safe_even_if_absent() {
    // GIVEN: Nothing staged
    let dir = TempDir::new().unwrap();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();

    // WHEN / THEN: Removing twice is fine
    registry.remove_image(NEW_SHORTCUT_ID).await.unwrap();
    registry.remove_image(NEW_SHORTCUT_ID).await.unwrap();
}

#[tokio::test]
async fn given_unknown_id_when_uploading_image_then_not_found() {
    // GIVEN: An empty registry
    let dir = TempDir::new().unwrap();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    let source = write_png(dir.path(), "upload.png");

    // WHEN: Uploading for an id that does not exist
    let result = registry.upload_image("ghost", &source).await;

    // THEN: NotFound, nothing written
    assert!(matches!(result, Err(ShortcutError::NotFound { .. })));
    assert_eq!(registry.image_path("ghost"), None);
}

/// **VALUE**: Verifies shortcuts survive a restart in insertion order.
#[tokio::test]
async fn given_saved_shortcuts_when_registry_reopened_then_order_and_images_restored() {
    // GIVEN: Shortcuts saved by one registry instance
    let dir = TempDir::new().unwrap();
    {
        let registry = ShortcutRegistry::open(dir.path()).unwrap();
        for id in ["z", "a", "m"] {
            registry.add(shortcut(id, "true")).await.unwrap();
        }
        let source = write_png(dir.path(), "upload.png");
        registry.upload_image("a", &source).await.unwrap();
    }

    // WHEN: Reopening
    let reopened = ShortcutRegistry::open(dir.path()).unwrap();

    // THEN: Same order, image path recovered
    let list = reopened.list().await;
    let ids: Vec<&str> = list.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["z", "a", "m"]);
    assert!(list[1].has_image());
    assert!(!list[0].has_image());
}

/// **VALUE**: Verifies mutations that write to disk complete and publish correctly when
/// the runtime has a single worker thread shared with readers.
///
/// **WHY THIS MATTERS**: The registry is driven from the same runtime as the socket
/// server; file writes must not stall the tasks serving clients.
///
/// **BUG THIS CATCHES**: Would catch a storage step that never returns to the actor
/// on a current-thread runtime, or a staged list published before its save finished.
#[tokio::test(flavor = "current_thread")]
async fn given_single_thread_runtime_when_mutating_concurrently_then_all_persisted() {
    // GIVEN: A registry and a reader polling the list the whole time
    let dir = TempDir::new().unwrap();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    let reader = {
        let registry = registry.clone();
        tokio::spawn(async move {
            let mut max_seen = 0;
            while max_seen < MAX_SHORTCUTS {
                max_seen = max_seen.max(registry.len().await);
                tokio::task::yield_now().await;
            }
            max_seen
        })
    };

    // WHEN: Filling every slot from separate tasks, then attaching an image
    let writers: Vec<_> = (0..MAX_SHORTCUTS)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.add(shortcut(&format!("s{i}"), "true")).await })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap().unwrap();
    }
    let source = write_png(dir.path(), "upload.png");
    let image = registry.upload_image("s0", &source).await.unwrap();

    // THEN: Reader observed the full list, and disk agrees with memory
    assert_eq!(reader.await.unwrap(), MAX_SHORTCUTS);
    assert!(image.exists());
    let reopened = ShortcutRegistry::open(dir.path()).unwrap();
    let mut ids: Vec<String> = reopened.list().await.into_iter().map(|s| s.id).collect();
    ids.sort();
    let mut expected: Vec<String> = (0..MAX_SHORTCUTS).map(|i| format!("s{i}")).collect();
    expected.sort();
    assert_eq!(ids, expected);
    assert!(reopened.list().await.iter().any(|s| s.id == "s0" && s.has_image()));
}
