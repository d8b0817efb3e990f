//! Inbound event routing.
//!
//! Every raw channel message passes through here exactly once: parse, log,
//! then dispatch any retrieval invocations to the orchestrator. Routing never
//! sends anything itself and never fails the channel; malformed payloads are
//! dropped with a warning, unknown event types are logged but not routed.

use std::sync::Arc;

use serde_json::Value;

use crate::core::events::{InboundEvent, ToolInvocation};
use crate::core::log::{Direction, LoggedEvent, wall_clock};
use crate::core::orchestrator::ResponseOrchestrator;
use crate::core::session::SessionHandle;

/// Dispatcher for messages arriving on the data channel.
pub struct EventRouter {
    handle: Arc<SessionHandle>,
    orchestrator: Arc<ResponseOrchestrator>,
    retrieval_tool: String,
}

impl EventRouter {
    /// Create a router dispatching invocations of `retrieval_tool` to the
    /// orchestrator.
    pub fn new(
        handle: Arc<SessionHandle>,
        orchestrator: Arc<ResponseOrchestrator>,
        retrieval_tool: impl Into<String>,
    ) -> Self {
        Self {
            handle,
            orchestrator,
            retrieval_tool: retrieval_tool.into(),
        }
    }

    /// Process one raw inbound message.
    ///
    /// Malformed payloads are dropped without reaching the log. Everything
    /// else is appended to the log exactly once, then any matching tool
    /// invocations are handed to the orchestrator as independent tasks.
    pub fn ingest(&self, raw: &[u8]) {
        let value: Value = match serde_json::from_slice(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "dropping malformed inbound message");
                return;
            }
        };

        self.handle.log().append(inbound_entry(&value));

        let invocations = self.extract_invocations(&value);
        for invocation in invocations {
            let orchestrator = self.orchestrator.clone();
            // Each invocation runs to completion on its own, with no
            // coordination against other invocations from the same event.
            tokio::spawn(async move {
                orchestrator.handle_tool_invocation(invocation).await;
            });
        }
    }

    /// Collect the retrieval invocations carried by one inbound event.
    fn extract_invocations(&self, value: &Value) -> Vec<ToolInvocation> {
        match InboundEvent::classify(value) {
            InboundEvent::ResponseDone(payload) => payload
                .response
                .output
                .iter()
                .filter_map(ToolInvocation::from_output_entry)
                .filter(|inv| inv.name == self.retrieval_tool)
                .collect(),
            InboundEvent::ToolCall(payload) => {
                let invocation = ToolInvocation::from_tool_call(&payload);
                if invocation.name == self.retrieval_tool {
                    vec![invocation]
                } else {
                    tracing::debug!(tool = %invocation.name, "ignoring unrecognized tool call");
                    Vec::new()
                }
            }
            InboundEvent::Other => Vec::new(),
        }
    }
}

/// Build the log entry for an inbound payload, timestamping on receipt when
/// the remote side did not include one.
fn inbound_entry(value: &Value) -> LoggedEvent {
    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let event_id = value
        .get("event_id")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(wall_clock);
    LoggedEvent {
        event_type,
        event_id,
        timestamp,
        direction: Direction::Inbound,
        payload: value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbound_entry_assigns_timestamp_when_absent() {
        let entry = inbound_entry(&json!({"type": "response.done"}));
        assert_eq!(entry.event_type, "response.done");
        assert_eq!(entry.direction, Direction::Inbound);
        assert!(!entry.timestamp.is_empty());
    }

    #[test]
    fn test_inbound_entry_keeps_remote_timestamp() {
        let entry = inbound_entry(&json!({
            "type": "session.updated",
            "event_id": "evt_1",
            "timestamp": "09:15:42",
        }));
        assert_eq!(entry.timestamp, "09:15:42");
        assert_eq!(entry.event_id.as_deref(), Some("evt_1"));
    }

    #[test]
    fn test_inbound_entry_unknown_type() {
        let entry = inbound_entry(&json!({"kind": "no-type-field"}));
        assert_eq!(entry.event_type, "unknown");
    }
}
