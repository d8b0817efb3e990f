//! Error taxonomy for the voicerag session core.
//!
//! Session-startup errors (`Credential`, `MediaAccess`, `Handshake`) are fatal
//! to that start attempt and leave the session inactive. Everything else is
//! recoverable: per-event and per-invocation failures are contained inside the
//! router and orchestrator and never abort the session.

use thiserror::Error;

/// Errors produced by the transport session, router and orchestrator.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The ephemeral credential could not be obtained
    #[error("credential fetch failed: {0}")]
    Credential(String),

    /// Local audio capture could not be acquired
    #[error("media access failed: {0}")]
    MediaAccess(String),

    /// The offer/answer negotiation did not complete
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// A session is already active; stop it before starting another
    #[error("a session is already active")]
    AlreadyActive,

    /// A send was attempted with no open message channel
    #[error("no open message channel")]
    ChannelUnavailable,

    /// An inbound payload could not be parsed; the event is dropped
    #[error("malformed inbound event: {0}")]
    MalformedEvent(String),

    /// An outbound event could not be serialized
    #[error("event serialization failed: {0}")]
    Serialization(String),

    /// Tool-call arguments did not parse as a query object
    #[error("tool arguments did not parse: {0}")]
    ArgumentParse(String),

    /// The retrieval service was unreachable or returned a non-success status
    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
