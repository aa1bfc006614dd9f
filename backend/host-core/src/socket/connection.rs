//! Per-connection state and the broadcast capability.

use crate::error::socket::SocketError;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::debug;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use uuid::Uuid;

/// Outbound frames buffered per connection before it counts as stalled.
pub(crate) const OUTBOUND_CAPACITY: usize = 64;

/// Something a broadcast can be delivered to.
///
/// Delivery is best-effort and must not block: a sink that cannot take a
/// frame reports an error and is dropped by the caller.
pub trait MessageSink: Send + Sync {
    fn id(&self) -> Uuid;

    /// Whether this sink should receive broadcasts.
    fn is_subscribed(&self) -> bool;

    fn deliver(&self, frame: &str) -> Result<(), SocketError>;

    fn close(&self);
}

/// Deliver `frame` to every subscribed sink; returns the ids that failed.
pub(crate) fn fan_out(sinks: &[Arc<dyn MessageSink>], frame: &str) -> Vec<Uuid> {
    sinks
        .iter()
        .filter(|sink| sink.is_subscribed())
        .filter_map(|sink| match sink.deliver(frame) {
            Ok(()) => None,
            Err(e) => {
                debug!("Delivery to {} failed: {e}", sink.id());
                Some(sink.id())
            }
        })
        .collect()
}

/// One accepted WebSocket session.
///
/// The session task owns the read half; writes go through `outbound` to a
/// dedicated writer task. `authenticated` is only ever set by the session.
pub(crate) struct Connection {
    id: Uuid,
    peer: SocketAddr,
    outbound: mpsc::Sender<Message>,
    authenticated: AtomicBool,
    closed: AtomicBool,
    last_activity: StdMutex<Instant>,
}

impl Connection {
    pub(crate) fn new(peer: SocketAddr, outbound: mpsc::Sender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            outbound,
            authenticated: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            last_activity: StdMutex::new(Instant::now()),
        }
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_authenticated(&self) {
        self.authenticated.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn touch(&self) {
        if let Ok(mut last) = self.last_activity.lock() {
            *last = Instant::now();
        }
    }

    pub(crate) fn idle_since(&self) -> Option<Instant> {
        self.last_activity.lock().ok().map(|last| *last)
    }

    pub(crate) fn send_text(&self, frame: String) -> Result<(), SocketError> {
        if self.is_closed() {
            return Err(SocketError::Send {
                message: format!("Connection {} is closed", self.id),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.outbound
            .try_send(Message::text(frame))
            .map_err(|e| SocketError::Send {
                message: format!("Connection {} cannot take more frames: {e}", self.id),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Queue a close frame; later sends fail.
    pub(crate) fn close_with(&self, code: CloseCode, reason: &str) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let frame = CloseFrame {
            code,
            reason: reason.to_string().into(),
        };
        let _ = self.outbound.try_send(Message::Close(Some(frame)));
    }
}

impl MessageSink for Connection {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_subscribed(&self) -> bool {
        self.is_authenticated() && !self.is_closed()
    }

    fn deliver(&self, frame: &str) -> Result<(), SocketError> {
        self.send_text(frame.to_string())
    }

    fn close(&self) {
        self.close_with(CloseCode::Away, "server closing connection");
    }
}
