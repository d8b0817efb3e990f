//! Transport session: lifecycle, channel ownership and the send primitive.
//!
//! The session is the leaf of the system: it owns the peer connection and the
//! data channel, and everything else (router, orchestrator) works through the
//! shared [`SessionHandle`]. At most one session is active at a time.

mod credentials;
mod media;
mod transport;

pub use media::{MediaSource, NullSink, PlaybackSink, SilenceSource};
pub use transport::{TransportConfig, TransportSession};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::core::events::ClientEvent;
use crate::core::log::{ConversationLog, Direction, LoggedEvent, wall_clock};
use crate::errors::{SessionError, SessionResult};

/// Wire seam over the message channel.
///
/// The production implementation writes to the WebRTC data channel; tests
/// substitute a capturing sink. The handle owns whichever sink is attached
/// and detaches it when the session stops.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Transmit one serialized event over the channel.
    async fn transmit(&self, payload: String) -> SessionResult<()>;
}

/// Single-owner holder for the mutable session state.
///
/// Holds the active flag, the attached channel sink and the conversation log.
/// Mutation happens only from the cooperative async context, so short
/// non-await lock sections suffice.
pub struct SessionHandle {
    active: AtomicBool,
    sink: Mutex<Option<Arc<dyn EventSink>>>,
    log: ConversationLog,
}

impl SessionHandle {
    /// Create an inactive handle with an empty log.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            active: AtomicBool::new(false),
            sink: Mutex::new(None),
            log: ConversationLog::new(),
        })
    }

    /// Whether a session is currently active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// The conversation log for the current session.
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Channel-open transition: attach the sink, mark the session active and
    /// reset the log. This is the only point at which the log is cleared.
    pub fn open_channel(&self, sink: Arc<dyn EventSink>) {
        *self.sink.lock() = Some(sink);
        self.active.store(true, Ordering::SeqCst);
        self.log.clear();
    }

    /// Channel-close transition: detach the sink and mark inactive. Sends
    /// attempted afterwards fail with `ChannelUnavailable`.
    pub fn close_channel(&self) {
        *self.sink.lock() = None;
        self.active.store(false, Ordering::SeqCst);
    }

    /// Send an event over the channel and record it in the log.
    ///
    /// Assigns an event identifier if absent (before serialization), then
    /// transmits, then timestamps and appends the event to the log exactly
    /// once. Fails with `ChannelUnavailable` when no sink is attached, in
    /// which case nothing is logged.
    pub async fn send(&self, event: ClientEvent) -> SessionResult<LoggedEvent> {
        let sink = self
            .sink
            .lock()
            .clone()
            .ok_or(SessionError::ChannelUnavailable)?;

        let mut value = serde_json::to_value(&event)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;

        let event_id = value
            .get("event_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if let Value::Object(map) = &mut value {
            map.insert("event_id".to_string(), Value::String(event_id.clone()));
        }

        sink.transmit(value.to_string()).await?;

        let entry = LoggedEvent {
            event_type: value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            event_id: Some(event_id),
            timestamp: wall_clock(),
            direction: Direction::Outbound,
            payload: value,
        };
        self.log.append(entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct CaptureSink {
        tx: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl EventSink for CaptureSink {
        async fn transmit(&self, payload: String) -> SessionResult<()> {
            self.tx
                .send(payload)
                .map_err(|_| SessionError::ChannelUnavailable)
        }
    }

    fn open_handle() -> (Arc<SessionHandle>, mpsc::UnboundedReceiver<String>) {
        let handle = SessionHandle::new();
        let (tx, rx) = mpsc::unbounded_channel();
        handle.open_channel(Arc::new(CaptureSink { tx }));
        (handle, rx)
    }

    #[tokio::test]
    async fn test_send_without_channel_fails_and_logs_nothing() {
        let handle = SessionHandle::new();
        let err = handle
            .send(ClientEvent::response_trigger())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ChannelUnavailable));
        assert!(handle.log().is_empty());
    }

    #[tokio::test]
    async fn test_send_assigns_id_before_transmission() {
        let (handle, mut rx) = open_handle();
        let entry = handle
            .send(ClientEvent::user_message("hi"))
            .await
            .unwrap();

        let wire = rx.try_recv().unwrap();
        let wire: Value = serde_json::from_str(&wire).unwrap();
        let wire_id = wire["event_id"].as_str().unwrap();
        assert!(!wire_id.is_empty());
        assert_eq!(entry.event_id.as_deref(), Some(wire_id));
        assert!(!entry.timestamp.is_empty());
    }

    #[tokio::test]
    async fn test_outbound_ids_unique_across_log() {
        let (handle, _rx) = open_handle();
        for _ in 0..8 {
            handle.send(ClientEvent::response_trigger()).await.unwrap();
        }
        let snapshot = handle.log().snapshot();
        let mut ids: Vec<_> = snapshot
            .iter()
            .map(|e| e.event_id.clone().unwrap())
            .collect();
        assert!(ids.iter().all(|id| !id.is_empty()));
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[tokio::test]
    async fn test_open_channel_clears_log_once() {
        let (handle, _rx) = open_handle();
        handle.send(ClientEvent::response_trigger()).await.unwrap();
        assert_eq!(handle.log().len(), 1);

        // A new session's channel-open resets the log
        let (tx, _rx2) = mpsc::unbounded_channel();
        handle.open_channel(Arc::new(CaptureSink { tx }));
        assert!(handle.log().is_empty());
        assert!(handle.is_active());
    }

    #[tokio::test]
    async fn test_close_channel_deactivates() {
        let (handle, _rx) = open_handle();
        assert!(handle.is_active());
        handle.close_channel();
        assert!(!handle.is_active());
        assert!(matches!(
            handle.send(ClientEvent::response_trigger()).await,
            Err(SessionError::ChannelUnavailable)
        ));
    }
}
