use crate::helpers::socket_client::{
    authenticate, connect, is_closed_within, is_silent_for, receive_json, receive_kind, send_json,
};
use crate::helpers::temp_credentials;

use host_core::settings::Settings;
use host_core::shortcuts::ShortcutRegistry;
use host_core::socket::{SocketOptions, SocketServer};

use models::{DeviceState, MAX_SHORTCUTS, ShortcutBuilder};

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

const AUTH_TIMEOUT: Duration = Duration::from_millis(400);
const RECV_LIMIT: Duration = Duration::from_secs(2);

struct TestServer {
    server: SocketServer,
    addr: SocketAddr,
    secret: String,
    registry: ShortcutRegistry,
    _dir: TempDir,
}

async fn start_server(disable_auth: bool) -> TestServer {
    let (dir, _settings, credentials) = temp_credentials(Settings {
        disable_socket_auth: disable_auth,
        ..Default::default()
    });
    let secret = credentials.get_secret().await.unwrap().expose().to_string();
    let registry = ShortcutRegistry::open(dir.path()).unwrap();
    let server = SocketServer::new(
        SocketOptions {
            port: 0,
            auth_timeout: AUTH_TIMEOUT,
        },
        credentials,
        registry.clone(),
    );
    let addr = server.start().await.expect("Failed to start socket server");

    TestServer {
        server,
        addr,
        secret,
        registry,
        _dir: dir,
    }
}

/// **VALUE**: Verifies the correct secret authenticates and the client then gets state.
///
/// **WHY THIS MATTERS**: This is the device's only way in; if the ack or the initial
/// shortcut set is missing, the device UI stays blank.
#[tokio::test]
async fn given_correct_secret_when_authenticating_then_ack_and_shortcuts_received() {
    // GIVEN: A server with one shortcut
    let test = start_server(false).await;
    test.registry
        .add(
            ShortcutBuilder::default()
                .with_id("term")
                .with_command("xterm")
                .build()
                .unwrap(),
        )
        .await
        .unwrap();
    let mut ws = connect(test.addr).await;

    // WHEN: Sending the secret
    let ack = authenticate(&mut ws, &test.secret).await;

    // THEN: Success ack, then the shortcut set
    assert_eq!(ack, json!({"type": "auth", "data": {"success": true}}));
    let shortcuts = receive_json(&mut ws, RECV_LIMIT).await;
    assert_eq!(shortcuts["type"], "shortcuts");
    assert_eq!(shortcuts["data"][0]["id"], "term");
    assert_eq!(test.server.authenticated_count().await, 1);
}

/// **VALUE**: Verifies a wrong secret closes the connection at once.
///
/// **BUG THIS CATCHES**: Would catch leaving a rejected connection open, which lets a
/// local process brute-force the secret on one session.
#[tokio::test]
async fn given_wrong_secret_when_authenticating_then_connection_closed() {
    // GIVEN: A running server
    let test = start_server(false).await;
    let mut ws = connect(test.addr).await;

    // WHEN: Sending a wrong secret
    send_json(&mut ws, json!({"type": "auth", "data": "nope"})).await;

    // THEN: Closed well before the auth timeout would fire
    assert!(is_closed_within(&mut ws, AUTH_TIMEOUT / 2).await);
}

/// **VALUE**: Verifies silent connections are closed after the auth window, not before.
///
/// **WHY THIS MATTERS**: Closing early breaks slow devices; never closing leaks
/// sockets to anything that connects and idles.
#[tokio::test]
async fn given_silent_connection_when_auth_window_passes_then_closed_only_after_timeout() {
    // GIVEN: A connected client that says nothing
    let test = start_server(false).await;
    let mut ws = connect(test.addr).await;

    // WHEN / THEN: Still open halfway through the window
    assert!(is_silent_for(&mut ws, AUTH_TIMEOUT / 2).await);

    // THEN: Closed once the window has elapsed
    assert!(is_closed_within(&mut ws, AUTH_TIMEOUT * 2).await);
}

/// **VALUE**: Verifies non-auth requests are ignored before authentication.
///
/// **BUG THIS CATCHES**: Would catch answering `shortcuts` to an unauthenticated client,
/// or closing it for sending the wrong thing first.
#[tokio::test]
async fn given_unauthenticated_client_when_requesting_shortcuts_then_ignored_and_auth_still_works() {
    // GIVEN: A connected, unauthenticated client
    let test = start_server(false).await;
    let mut ws = connect(test.addr).await;

    // WHEN: Asking for shortcuts first
    send_json(&mut ws, json!({"type": "shortcuts"})).await;

    // THEN: No reply, and authenticating afterwards still succeeds
    assert!(is_silent_for(&mut ws, Duration::from_millis(100)).await);
    let ack = authenticate(&mut ws, &test.secret).await;
    assert_eq!(ack["data"]["success"], true);
}

#[tokio::test]
async fn given_auth_disabled_when_connecting_then_state_arrives_without_auth() {
    // GIVEN: Auth disabled
    let test = start_server(true).await;

    // WHEN: Connecting
    let mut ws = connect(test.addr).await;

    // THEN: The shortcut set arrives unprompted
    let first = receive_json(&mut ws, RECV_LIMIT).await;
    assert_eq!(first["type"], "shortcuts");
}

/// **VALUE**: Verifies device state pushes reach authenticated clients only.
#[tokio::test]
async fn given_authenticated_and_pending_clients_when_state_published_then_only_authenticated_receives() {
    // GIVEN: One authenticated and one pending client
    let test = start_server(false).await;
    let mut authed = connect(test.addr).await;
    authenticate(&mut authed, &test.secret).await;
    receive_kind(&mut authed, "shortcuts", RECV_LIMIT).await;
    let mut pending = connect(test.addr).await;

    // WHEN: Publishing a state change
    test.server.publish_device_state(DeviceState::Ready).await;

    // THEN: Only the authenticated client hears it
    let pushed = receive_kind(&mut authed, "device_state", RECV_LIMIT).await;
    assert_eq!(pushed["data"], "ready");
    assert!(is_silent_for(&mut pending, Duration::from_millis(100)).await);
}

/// **VALUE**: Verifies a successful mutation is broadcast to every authenticated client.
///
/// **WHY THIS MATTERS**: Several clients (device + dev tools) must agree on the set.
#[tokio::test]
async fn given_two_clients_when_one_adds_shortcut_then_both_receive_new_set() {
    // GIVEN: Two authenticated clients
    let test = start_server(false).await;
    let mut first = connect(test.addr).await;
    let mut second = connect(test.addr).await;
    for ws in [&mut first, &mut second] {
        authenticate(ws, &test.secret).await;
        receive_kind(ws, "shortcuts", RECV_LIMIT).await;
    }

    // WHEN: The first adds a shortcut
    send_json(
        &mut first,
        json!({"type": "shortcut_add", "data": {"id": "calc", "command": "gnome-calculator"}}),
    )
    .await;

    // THEN: Both get the updated set
    for ws in [&mut first, &mut second] {
        let set = receive_kind(ws, "shortcuts", RECV_LIMIT).await;
        assert_eq!(set["data"][0]["id"], "calc");
        assert_eq!(set["data"][0]["command"], "gnome-calculator");
    }
}

/// **VALUE**: Verifies a failed mutation is reported to the requester only.
#[tokio::test]
async fn given_full_registry_when_client_adds_then_error_reply_and_no_broadcast() {
    // GIVEN: A full registry and two clients
    let test = start_server(false).await;
    for i in 0..MAX_SHORTCUTS {
        test.registry
            .add(
                ShortcutBuilder::default()
                    .with_id(format!("s{i}"))
                    .with_command("true")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
    }
    let mut requester = connect(test.addr).await;
    let mut bystander = connect(test.addr).await;
    for ws in [&mut requester, &mut bystander] {
        authenticate(ws, &test.secret).await;
        receive_kind(ws, "shortcuts", RECV_LIMIT).await;
    }

    // WHEN: Adding a 9th
    send_json(
        &mut requester,
        json!({"type": "shortcut_add", "data": {"command": "true"}}),
    )
    .await;

    // THEN: Requester gets an error, bystander hears nothing
    let error = receive_json(&mut requester, RECV_LIMIT).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["data"]["request"], "shortcut_add");
    assert!(is_silent_for(&mut bystander, Duration::from_millis(150)).await);
    assert_eq!(test.registry.len().await, MAX_SHORTCUTS);
}

/// **VALUE**: Verifies start is idempotent and stop closes clients and the listener.
#[tokio::test]
async fn given_running_server_when_started_again_and_stopped_then_same_addr_and_clients_closed() {
    // GIVEN: A running server with an authenticated client
    let test = start_server(false).await;
    let mut ws = connect(test.addr).await;
    authenticate(&mut ws, &test.secret).await;

    // WHEN: Starting again
    let again = test.server.start().await.unwrap();

    // THEN: Same address
    assert_eq!(again, test.addr);
    assert!(test.server.is_started().await);

    // WHEN: Stopping
    test.server.stop().await;

    // THEN: Listener gone, client closed
    assert!(!test.server.is_started().await);
    assert!(is_closed_within(&mut ws, RECV_LIMIT).await);
    assert_eq!(test.server.connection_count().await, 0);
}

/// **VALUE**: Verifies a TCP client that never sends the upgrade request is dropped.
///
/// **WHY THIS MATTERS**: The auth window must also cover the handshake; otherwise any
/// local process can pin a task and a socket forever by connecting and idling.
///
/// **BUG THIS CATCHES**: Would catch an unbounded `accept_async` before the auth
/// deadline starts.
#[tokio::test]
async fn given_raw_tcp_client_without_upgrade_when_auth_window_passes_then_closed() {
    // GIVEN: A plain TCP connection that sends nothing
    let test = start_server(false).await;
    let mut stream = TcpStream::connect(test.addr).await.unwrap();

    // WHEN: Reading until the server gives up on it
    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(AUTH_TIMEOUT * 2, stream.read(&mut buf)).await;

    // THEN: The server closed it (EOF or reset) within the window
    match read {
        Ok(Ok(0)) | Ok(Err(_)) => {}
        other => panic!("Expected the server to close the stream, got {other:?}"),
    }
    assert_eq!(test.server.connection_count().await, 0);
}
