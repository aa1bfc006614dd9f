// Unit tests for the platform-tools download fallback

use crate::ADB_BINARY;
use crate::bridge::{
    BridgeOptions, PLATFORM_TOOLS_ARCHIVE, acquire_platform_tools, downloaded_executable,
    locate_executable,
};
use crate::error::bridge::BridgeError;

use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn platform_tools_zip() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(format!("platform-tools/{ADB_BINARY}"), SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"#!/bin/sh\necho fake adb\n").unwrap();
    writer
        .start_file("platform-tools/NOTICE.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"notice").unwrap();
    writer.finish().unwrap().into_inner()
}

/// **VALUE**: Verifies the fallback downloads the pinned archive and extracts adb.
///
/// **WHY THIS MATTERS**: Users without Android tooling depend on this path to use the
/// device at all.
///
/// **BUG THIS CATCHES**: Would catch a wrong archive name, a broken extraction target,
/// or a missing executable check after extraction.
#[tokio::test]
async fn given_archive_served_when_acquire_called_then_extracts_adb_into_data_dir() {
    // GIVEN: A mock server hosting the archive
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{PLATFORM_TOOLS_ARCHIVE}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(platform_tools_zip()))
        .expect(1)
        .mount(&server)
        .await;
    let data_dir = TempDir::new().unwrap();

    // WHEN: Acquiring platform-tools
    let exe = acquire_platform_tools(&server.uri(), data_dir.path())
        .await
        .unwrap();

    // THEN: adb exists at the expected location
    assert_eq!(exe, downloaded_executable(data_dir.path()));
    assert!(exe.is_file());
}

/// **VALUE**: Verifies an earlier download is reused instead of fetched again.
#[tokio::test]
async fn given_previous_download_when_acquire_called_then_no_request_is_made() {
    // GIVEN: adb already extracted, and a server that must not be hit
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let data_dir = TempDir::new().unwrap();
    let exe = downloaded_executable(data_dir.path());
    std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
    std::fs::write(&exe, b"adb").unwrap();

    // WHEN: Acquiring
    let resolved = acquire_platform_tools(&server.uri(), data_dir.path())
        .await
        .unwrap();

    // THEN: The existing file is used
    assert_eq!(resolved, exe);
}

#[tokio::test]
async fn given_missing_archive_when_acquire_called_then_download_failed() {
    // GIVEN: The archive is not found
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let data_dir = TempDir::new().unwrap();

    // WHEN: Acquiring
    let result = acquire_platform_tools(&server.uri(), data_dir.path()).await;

    // THEN: DownloadFailed, no retry storm on a permanent error
    assert!(matches!(result, Err(BridgeError::DownloadFailed { .. })));
}

/// **BUG THIS CATCHES**: Would catch treating a corrupt body (e.g. a captive-portal
/// HTML page) as a valid archive.
#[tokio::test]
async fn given_corrupt_archive_when_acquire_called_then_extract_failed() {
    // GIVEN: A body that is not a zip
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;
    let data_dir = TempDir::new().unwrap();

    // WHEN: Acquiring
    let result = acquire_platform_tools(&server.uri(), data_dir.path()).await;

    // THEN: ExtractFailed
    assert!(matches!(result, Err(BridgeError::ExtractFailed { .. })));
}

fn explicit_options(adb_path: &Path, data_dir: &Path) -> BridgeOptions {
    BridgeOptions {
        adb_path: Some(adb_path.to_path_buf()),
        allow_download: false,
        download_base_url: "http://127.0.0.1:9/".to_string(),
        data_dir: data_dir.to_path_buf(),
        command_timeout: Duration::from_secs(1),
        webapp_dir: None,
    }
}

/// **VALUE**: A configured adb path wins over PATH lookup and download.
///
/// **BUG THIS CATCHES**: Would catch the explicit path being ignored or replaced by
/// a memoized PATH result.
#[tokio::test]
async fn given_explicit_adb_file_when_locating_then_returns_it() {
    // GIVEN: A configured file
    let data_dir = TempDir::new().unwrap();
    let adb = data_dir.path().join("my-adb");
    std::fs::write(&adb, b"binary").unwrap();

    // WHEN: Locating
    let located = locate_executable(&explicit_options(&adb, data_dir.path()))
        .await
        .unwrap();

    // THEN: The configured path
    assert_eq!(located, adb);
}

#[tokio::test]
async fn given_explicit_adb_missing_when_locating_then_unavailable() {
    // GIVEN: A configured path with nothing behind it
    let data_dir = TempDir::new().unwrap();
    let adb = data_dir.path().join("missing-adb");

    // WHEN: Locating
    let result = locate_executable(&explicit_options(&adb, data_dir.path())).await;

    // THEN: Unavailable, without falling back
    assert!(matches!(result, Err(BridgeError::Unavailable { .. })), "got {result:?}");
}
