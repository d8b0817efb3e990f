//! Response orchestration over the retrieval loop.
//!
//! Two flows converge here. The user-message flow eagerly retrieves grounding
//! documents for every submitted message and stages them before triggering a
//! response. The tool-invocation flow answers retrieval calls the model makes
//! on its own, falling back to an apology response when retrieval cannot
//! produce anything.

use std::sync::Arc;

use crate::core::events::{ClientEvent, RetrievalQuery, ToolInvocation};
use crate::core::retrieval::RetrievalClient;
use crate::core::session::SessionHandle;
use crate::errors::{SessionError, SessionResult};

/// Instruction prefixed to every user message, constraining the model to the
/// retrieved documents.
pub const GROUNDING_INSTRUCTION: &str = "Answer only using the retrieved documents from our knowledge base. If no relevant document is found, respond with 'I cannot answer.'";

/// Spoken apology when a retrieval invocation cannot be served.
pub const RETRIEVAL_FALLBACK: &str =
    "Sorry, I couldn't retrieve any document for that question.";

/// Coordinator between the session channel and the retrieval backend.
pub struct ResponseOrchestrator {
    handle: Arc<SessionHandle>,
    retrieval: RetrievalClient,
    tool_name: String,
}

impl ResponseOrchestrator {
    /// Create an orchestrator answering retrieval calls for `tool_name`.
    pub fn new(
        handle: Arc<SessionHandle>,
        retrieval: RetrievalClient,
        tool_name: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            handle,
            retrieval,
            tool_name: tool_name.into(),
        })
    }

    /// Submit a user message with eager grounding.
    ///
    /// Sends, in order: the user message prefixed with the grounding
    /// instruction, the retrieved documents as a tool result, and a bare
    /// response trigger. Retrieval runs on the original text, not the
    /// prefixed form. The first failing step aborts the sequence; earlier
    /// sends are not retracted.
    pub async fn send_user_message(&self, text: &str) -> SessionResult<()> {
        let prefixed = format!("{GROUNDING_INSTRUCTION}\n\n{text}");
        self.handle.send(ClientEvent::user_message(&prefixed)).await?;

        let documents = self.retrieval.retrieve(text).await?;
        self.handle
            .send(ClientEvent::tool_response(&self.tool_name, documents))
            .await?;
        self.handle.send(ClientEvent::response_trigger()).await?;
        Ok(())
    }

    /// Serve one retrieval invocation extracted from the inbound stream.
    ///
    /// Runs as an independent task: failures are logged, answered with the
    /// fallback response, and never surfaced to the channel loop. A late
    /// invocation racing session teardown loses the channel and its sends
    /// fail with `ChannelUnavailable`, which is likewise non-fatal.
    pub async fn handle_tool_invocation(&self, invocation: ToolInvocation) {
        let query: RetrievalQuery = match serde_json::from_str(&invocation.arguments) {
            Ok(query) => query,
            Err(err) => {
                tracing::warn!(
                    call_id = %invocation.call_id,
                    %err,
                    "tool invocation carried unparseable arguments"
                );
                self.send_fallback().await;
                return;
            }
        };

        match self.retrieval.retrieve(&query.query).await {
            Ok(documents) => {
                if let Err(err) = self
                    .handle
                    .send(ClientEvent::response_with_instructions(documents))
                    .await
                {
                    self.note_late_send(&invocation, err);
                }
            }
            Err(err) => {
                tracing::warn!(call_id = %invocation.call_id, %err, "retrieval failed");
                self.send_fallback().await;
            }
        }
    }

    /// Send the apology response; failures here are terminal for the task.
    async fn send_fallback(&self) {
        if let Err(err) = self
            .handle
            .send(ClientEvent::response_with_instructions(
                RETRIEVAL_FALLBACK.to_string(),
            ))
            .await
        {
            tracing::warn!(%err, "fallback response could not be sent");
        }
    }

    fn note_late_send(&self, invocation: &ToolInvocation, err: SessionError) {
        tracing::warn!(
            call_id = %invocation.call_id,
            %err,
            "retrieval result could not be delivered"
        );
    }
}
