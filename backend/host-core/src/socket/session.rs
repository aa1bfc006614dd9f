//! One client session: handshake, authentication window, then dispatch.

use super::ServerInner;
use super::connection::{Connection, MessageSink, OUTBOUND_CAPACITY};
use crate::error::socket::SocketError;
use crate::shortcuts::launch;

use common::ErrorLocation;

use models::{
    AuthAck, ClientMessage, ErrorPayload, MAX_SHORTCUTS, ServerMessage, ShortcutBuilder,
};

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::TcpStream;
use tokio::spawn as TokioSpawn;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant as TokioInstant, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{WebSocketStream, accept_async};
use uuid::Uuid;

type WsRead = SplitStream<WebSocketStream<TcpStream>>;
type WsWrite = SplitSink<WebSocketStream<TcpStream>, Message>;

const AUTH_FAILED_REASON: &str = "authentication failed";
const AUTH_TIMEOUT_REASON: &str = "authentication timeout";

enum AuthOutcome {
    Authenticated,
    Rejected,
    Gone,
}

/// Drive one accepted TCP stream until it disconnects or the server stops.
pub(crate) async fn serve_connection(
    inner: Arc<ServerInner>,
    stream: TcpStream,
    peer: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), SocketError> {
    if !peer.ip().is_loopback() {
        warn!("Rejected non-loopback connection from {peer}");
        return Ok(());
    }

    // The auth window covers the upgrade too.
    let deadline = TokioInstant::now() + inner.options.auth_timeout;

    let ws_stream = match timeout_at(deadline, accept_async(stream)).await {
        Ok(handshake) => handshake.map_err(|e| SocketError::Handshake {
            message: format!("WebSocket handshake with {peer} failed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?,
        Err(_) => {
            warn!("Client {peer} did not complete the handshake in time");
            return Ok(());
        }
    };

    let (write, mut read) = ws_stream.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    TokioSpawn(write_frames(write, outbound_rx));

    let conn = Arc::new(Connection::new(peer, outbound_tx));
    let conn_id = conn.id();
    inner
        .connections
        .write()
        .await
        .insert(conn_id, Arc::clone(&conn));
    info!("Client {peer} connected as {conn_id}");

    let outcome = if inner.credentials.is_auth_disabled().await {
        debug!("Socket auth disabled, promoting {conn_id}");
        AuthOutcome::Authenticated
    } else {
        authenticate(&inner, &conn, &mut read, &mut shutdown, deadline).await
    };

    let result = match outcome {
        AuthOutcome::Authenticated => {
            conn.mark_authenticated();
            send_snapshot(&inner, &conn).await;
            dispatch_loop(&inner, &conn, &mut read, &mut shutdown).await
        }
        AuthOutcome::Rejected | AuthOutcome::Gone => Ok(()),
    };

    inner.connections.write().await.remove(&conn_id);
    if let Some(last) = conn.idle_since() {
        debug!("Client {conn_id} last active {:?} ago", last.elapsed());
    }
    info!("Client {peer} disconnected");
    result
}

async fn write_frames(mut write: WsWrite, mut outbound_rx: mpsc::Receiver<Message>) {
    while let Some(frame) = outbound_rx.recv().await {
        let closing = frame.is_close();
        if let Err(e) = write.send(frame).await {
            debug!("Socket write failed: {e}");
            break;
        }
        if closing {
            break;
        }
    }
    let _ = write.close().await;
}

/// Wait for a correct `auth` message within the auth window.
///
/// Anything else is ignored; a wrong secret or the deadline closes the session.
async fn authenticate(
    inner: &ServerInner,
    conn: &Connection,
    read: &mut WsRead,
    shutdown: &mut watch::Receiver<bool>,
    deadline: TokioInstant,
) -> AuthOutcome {
    loop {
        let next = tokio::select! {
            next = timeout_at(deadline, read.next()) => next,
            _ = shutdown.changed() => {
                conn.close();
                return AuthOutcome::Gone;
            }
        };

        let frame = match next {
            Err(_) => {
                warn!("Client {} did not authenticate in time", conn.peer());
                conn.close_with(CloseCode::Policy, AUTH_TIMEOUT_REASON);
                return AuthOutcome::Rejected;
            }
            Ok(None) | Ok(Some(Ok(Message::Close(_)))) => return AuthOutcome::Gone,
            Ok(Some(Err(e))) => {
                debug!("Read error before auth from {}: {e}", conn.peer());
                return AuthOutcome::Gone;
            }
            Ok(Some(Ok(Message::Text(text)))) => text,
            Ok(Some(Ok(_))) => continue,
        };

        conn.touch();

        match serde_json::from_str::<ClientMessage>(frame.as_str()) {
            Ok(ClientMessage::Auth(candidate)) => match inner.credentials.verify(&candidate).await {
                Ok(true) => {
                    info!("Client {} authenticated", conn.peer());
                    if let Ok(ack) = (ServerMessage::Auth(AuthAck { success: true })).to_json() {
                        let _ = conn.send_text(ack);
                    }
                    return AuthOutcome::Authenticated;
                }
                Ok(false) => {
                    warn!("Client {} auth failed: invalid secret", conn.peer());
                    conn.close_with(CloseCode::Policy, AUTH_FAILED_REASON);
                    return AuthOutcome::Rejected;
                }
                Err(e) => {
                    error!("Socket secret unavailable: {e}");
                    conn.close_with(CloseCode::Error, AUTH_FAILED_REASON);
                    return AuthOutcome::Rejected;
                }
            },
            Ok(other) => debug!(
                "Ignoring '{}' from unauthenticated {}",
                other.kind(),
                conn.peer()
            ),
            Err(_) => debug!("Ignoring unparseable frame from unauthenticated {}", conn.peer()),
        }
    }
}

/// Shortcuts, then the last known device and playback state.
async fn send_snapshot(inner: &ServerInner, conn: &Connection) {
    let mut messages = vec![ServerMessage::Shortcuts(inner.registry.list().await)];
    if let Some(state) = *inner.device_state.read().await {
        messages.push(ServerMessage::DeviceState(state));
    }
    if let Some(playback) = inner.playback.read().await.clone() {
        messages.push(ServerMessage::Playback(Some(playback)));
    }

    for message in messages {
        if let Err(e) = send_message(conn, &message) {
            warn!("Failed to send initial state to {}: {e}", conn.peer());
            return;
        }
    }
}

fn send_message(conn: &Connection, message: &ServerMessage) -> Result<(), SocketError> {
    conn.send_text(message.to_json()?)
}

fn send_error(conn: &Connection, request: &str, message: impl ToString) {
    let payload = ServerMessage::Error(ErrorPayload {
        request: request.to_string(),
        message: message.to_string(),
    });
    if let Err(e) = send_message(conn, &payload) {
        debug!("Could not report error to {}: {e}", conn.peer());
    }
}

async fn dispatch_loop(
    inner: &Arc<ServerInner>,
    conn: &Connection,
    read: &mut WsRead,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), SocketError> {
    loop {
        let next = tokio::select! {
            next = read.next() => next,
            _ = shutdown.changed() => {
                conn.close();
                return Ok(());
            }
        };

        let text = match next {
            None | Some(Ok(Message::Close(_))) => return Ok(()),
            Some(Err(e)) => {
                return Err(SocketError::Read {
                    message: format!("Error reading from {}: {e}", conn.peer()),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(_)) => continue,
        };

        conn.touch();
        if conn.is_closed() {
            return Ok(());
        }

        match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(message) => handle_message(inner, conn, message).await,
            Err(e) => {
                warn!("Invalid message from {}: {e}", conn.peer());
                send_error(conn, "unknown", format!("Invalid message: {e}"));
            }
        }
    }
}

async fn handle_message(inner: &Arc<ServerInner>, conn: &Connection, message: ClientMessage) {
    let kind = message.kind();
    debug!("Handling '{kind}' from {}", conn.peer());

    match message {
        ClientMessage::Auth(_) => {
            if let Err(e) = send_message(conn, &ServerMessage::Auth(AuthAck { success: true })) {
                debug!("Could not re-acknowledge auth: {e}");
            }
        }
        ClientMessage::Shortcuts => {
            let shortcuts = inner.registry.list().await;
            if let Err(e) = send_message(conn, &ServerMessage::Shortcuts(shortcuts)) {
                debug!("Could not send shortcuts to {}: {e}", conn.peer());
            }
        }
        ClientMessage::ShortcutAdd { id, command } => {
            if inner.registry.len().await >= MAX_SHORTCUTS {
                send_error(conn, kind, format!("At most {MAX_SHORTCUTS} shortcuts are allowed"));
                return;
            }

            let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let shortcut = match ShortcutBuilder::default()
                .with_id(id)
                .with_command(command)
                .build()
            {
                Ok(shortcut) => shortcut,
                Err(e) => {
                    send_error(conn, kind, e);
                    return;
                }
            };

            match inner.registry.add(shortcut).await {
                Ok(_) => inner.broadcast_shortcuts().await,
                Err(e) => send_error(conn, kind, e),
            }
        }
        ClientMessage::ShortcutUpdate { id, command } => {
            match inner.registry.update(&id, &command).await {
                Ok(_) => inner.broadcast_shortcuts().await,
                Err(e) => send_error(conn, kind, e),
            }
        }
        ClientMessage::ShortcutRemove { id } => match inner.registry.remove(&id).await {
            Ok(()) => inner.broadcast_shortcuts().await,
            Err(e) => send_error(conn, kind, e),
        },
        ClientMessage::ShortcutRun { id } => match inner.registry.get(&id).await {
            Some(shortcut) => {
                if let Err(e) = launch(&shortcut.command) {
                    send_error(conn, kind, e);
                }
            }
            None => send_error(conn, kind, format!("No shortcut with id '{id}'")),
        },
    }
}
