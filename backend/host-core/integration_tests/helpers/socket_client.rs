//! WebSocket client helpers for socket server tests.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn connect(addr: SocketAddr) -> Client {
    let url = format!("ws://{addr}");
    let (ws_stream, _) = connect_async(&url)
        .await
        .expect("Failed to connect to WebSocket server");
    ws_stream
}

pub async fn send_json(ws: &mut Client, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("Failed to send message");
}

/// Next text frame as JSON, failing the test after `limit`.
pub async fn receive_json(ws: &mut Client, limit: Duration) -> Value {
    loop {
        let msg = tokio::time::timeout(limit, ws.next())
            .await
            .expect("Timed out waiting for message")
            .expect("Stream ended")
            .expect("Error receiving message");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("Server sent invalid JSON");
            }
            Message::Close(frame) => panic!("Connection closed: {frame:?}"),
            _ => continue,
        }
    }
}

/// Next frame whose `type` is `kind`, skipping others.
pub async fn receive_kind(ws: &mut Client, kind: &str, limit: Duration) -> Value {
    loop {
        let value = receive_json(ws, limit).await;
        if value["type"] == kind {
            return value;
        }
    }
}

/// Send the secret and consume the acknowledgement.
pub async fn authenticate(ws: &mut Client, secret: &str) -> Value {
    send_json(ws, serde_json::json!({"type": "auth", "data": secret})).await;
    receive_json(ws, Duration::from_secs(2)).await
}

/// True if the server closes the connection within `limit`.
pub async fn is_closed_within(ws: &mut Client, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        match tokio::time::timeout_at(deadline, ws.next()).await {
            Err(_) => return false,
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
        }
    }
}

/// True if nothing at all arrives within `limit`.
pub async fn is_silent_for(ws: &mut Client, limit: Duration) -> bool {
    tokio::time::timeout(limit, ws.next()).await.is_err()
}
