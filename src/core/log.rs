//! Conversation log: the ordered record of every event sent and received.
//!
//! The log is append-only for the lifetime of one session and is cleared
//! exactly once per session, at the moment the message channel opens. Reads
//! return newest-first snapshots for presentation.

use parking_lot::RwLock;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;

/// Whether a logged event was sent by us or received from the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client instruction sent over the channel
    Outbound,
    /// Model/transport notification received over the channel
    Inbound,
}

/// One immutable entry in the conversation log.
#[derive(Debug, Clone)]
pub struct LoggedEvent {
    /// Event type tag
    pub event_type: String,
    /// Event identifier; always present and non-empty for outbound events
    pub event_id: Option<String>,
    /// Wall-clock timestamp assigned at send-or-receive time
    pub timestamp: String,
    /// Send or receive direction
    pub direction: Direction,
    /// Full event payload as transmitted/received
    pub payload: Value,
}

/// Append-only record of channel events for the active session.
///
/// Mutated only from the cooperative async context; the lock is held for
/// short, non-await critical sections.
#[derive(Debug, Default)]
pub struct ConversationLog {
    entries: RwLock<Vec<LoggedEvent>>,
}

impl ConversationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Entries are immutable once logged.
    pub fn append(&self, event: LoggedEvent) {
        self.entries.write().push(event);
    }

    /// Reset the log. Called once per session at channel-open.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of logged events.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of all entries, newest first.
    pub fn snapshot(&self) -> Vec<LoggedEvent> {
        let mut entries = self.entries.read().clone();
        entries.reverse();
        entries
    }
}

/// Wall-clock timestamp in HH:MM:SS, assigned to events as they are logged.
pub fn wall_clock() -> String {
    let format = format_description!("[hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_default()
}
