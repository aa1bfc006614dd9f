// Unit tests for broadcast fan-out over the MessageSink capability

use crate::error::socket::SocketError;
use crate::socket::{MessageSink, fan_out};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

struct RecordingSink {
    id: Uuid,
    subscribed: bool,
    fail: bool,
    received: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl RecordingSink {
    fn new(subscribed: bool, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            subscribed,
            fail,
            received: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    fn deliver(&self, frame: &str) -> Result<(), SocketError> {
        if self.fail {
            return Err(SocketError::Send {
                message: "sink full".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.received.lock().unwrap().push(frame.to_string());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// **VALUE**: Verifies a failing sink does not stop delivery to the others.
///
/// **WHY THIS MATTERS**: One stalled device connection must not starve every other
/// client of state updates.
///
/// **BUG THIS CATCHES**: Would catch short-circuiting on the first delivery error
/// (e.g. using `?` inside the loop).
#[test]
fn given_one_failing_sink_when_fan_out_then_others_still_receive_and_failure_reported() {
    // GIVEN: A healthy sink on each side of a failing one
    let first = RecordingSink::new(true, false);
    let broken = RecordingSink::new(true, true);
    let last = RecordingSink::new(true, false);
    let sinks: Vec<Arc<dyn MessageSink>> = vec![first.clone(), broken.clone(), last.clone()];

    // WHEN: Fanning out a frame
    let failed = fan_out(&sinks, r#"{"type":"shortcuts","data":[]}"#);

    // THEN: Healthy sinks got it, only the broken one is reported
    assert_eq!(first.received().len(), 1);
    assert_eq!(last.received().len(), 1);
    assert_eq!(failed, vec![broken.id]);
}

/// **VALUE**: Verifies unauthenticated sinks never see broadcasts.
///
/// **BUG THIS CATCHES**: Would catch leaking shortcut commands to a client that has not
/// presented the secret yet.
#[test]
fn given_unsubscribed_sink_when_fan_out_then_it_receives_nothing() {
    // GIVEN: An unauthenticated sink
    let pending = RecordingSink::new(false, false);
    let sinks: Vec<Arc<dyn MessageSink>> = vec![pending.clone()];

    // WHEN: Fanning out
    let failed = fan_out(&sinks, "{}");

    // THEN: Nothing delivered, nothing failed
    assert!(pending.received().is_empty());
    assert!(failed.is_empty());
    assert!(!pending.closed.load(Ordering::SeqCst));
}
