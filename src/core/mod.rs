pub mod events;
pub mod log;
pub mod orchestrator;
pub mod retrieval;
pub mod router;
pub mod session;

// Re-export commonly used types for convenience
pub use events::{
    ClientEvent, InboundEvent, InvocationKind, OutputItem, ResponseDonePayload, RetrievalQuery,
    ToolCallPayload, ToolInvocation,
};
pub use log::{ConversationLog, Direction, LoggedEvent};
pub use orchestrator::{GROUNDING_INSTRUCTION, RETRIEVAL_FALLBACK, ResponseOrchestrator};
pub use retrieval::RetrievalClient;
pub use router::EventRouter;
pub use session::{
    EventSink, MediaSource, NullSink, PlaybackSink, SessionHandle, SilenceSource, TransportConfig,
    TransportSession,
};
