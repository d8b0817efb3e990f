//! Channel event types for the realtime message protocol.
//!
//! Outbound events are the three client instructions the console sends over
//! the data channel. Inbound events come from an uncontrolled remote sender,
//! so their `type` tags are open-ended: classification keeps an explicit
//! `Other` fallback that is logged but never routed.
//!
//! # Protocol Overview
//!
//! Client events (sent over the channel):
//! - conversation.item.create - Add a user message to the conversation
//! - tool_response - Deliver a tool result
//! - response.create - Trigger response generation, optionally with instructions
//!
//! Server events (recognized):
//! - response.done - Completed response; may carry function_call output entries
//! - tool_call - Standalone tool-call notification

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// =============================================================================
// Outbound Events
// =============================================================================

/// Client events sent over the message channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Add an item (here always a user message) to the conversation
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        /// Item to create
        item: ConversationItem,
    },

    /// Deliver a tool result to the model
    #[serde(rename = "tool_response")]
    ToolResponse {
        /// Tool name and result payload
        tool: ToolResult,
        /// Correlation identifier for the tool call
        tool_call_id: String,
    },

    /// Trigger response generation
    #[serde(rename = "response.create")]
    ResponseCreate {
        /// Optional response configuration
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponseConfig>,
    },
}

impl ClientEvent {
    /// Build a user message event with `input_text` content.
    pub fn user_message(text: &str) -> Self {
        ClientEvent::ConversationItemCreate {
            item: ConversationItem {
                item_type: "message".to_string(),
                role: "user".to_string(),
                content: vec![ContentPart {
                    content_type: "input_text".to_string(),
                    text: text.to_string(),
                }],
            },
        }
    }

    /// Build a tool result event with a generated correlation identifier.
    pub fn tool_response(name: &str, result: String) -> Self {
        ClientEvent::ToolResponse {
            tool: ToolResult {
                name: name.to_string(),
                result,
            },
            tool_call_id: Uuid::new_v4().to_string(),
        }
    }

    /// Build a bare response-generation trigger.
    pub fn response_trigger() -> Self {
        ClientEvent::ResponseCreate { response: None }
    }

    /// Build a response-generation trigger carrying instructions to be
    /// spoken/rendered by the model.
    pub fn response_with_instructions(instructions: String) -> Self {
        ClientEvent::ResponseCreate {
            response: Some(ResponseConfig {
                instructions: Some(instructions),
            }),
        }
    }
}

/// Conversation item within a `conversation.item.create` event.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationItem {
    /// Item type (always "message" here)
    #[serde(rename = "type")]
    pub item_type: String,
    /// Item role
    pub role: String,
    /// Content parts
    pub content: Vec<ContentPart>,
}

/// Content part within a conversation item.
#[derive(Debug, Clone, Serialize)]
pub struct ContentPart {
    /// Content type (always "input_text" here)
    #[serde(rename = "type")]
    pub content_type: String,
    /// Text content
    pub text: String,
}

/// Tool name/result pair carried by a `tool_response` event.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Tool name
    pub name: String,
    /// Raw result text
    pub result: String,
}

/// Response configuration for `response.create`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseConfig {
    /// Instructions for the generated response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

// =============================================================================
// Inbound Events
// =============================================================================

/// Classification of an inbound channel message.
///
/// The remote side may add new `type` tags at any time; anything not
/// recognized lands in `Other` and is logged without being routed.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Completed response, possibly carrying embedded function calls
    ResponseDone(ResponseDonePayload),
    /// Standalone tool-call notification
    ToolCall(ToolCallPayload),
    /// Unknown event type
    Other,
}

impl InboundEvent {
    /// Classify a parsed inbound payload by its `type` tag.
    ///
    /// Recognized tags whose bodies fail typed extraction fall back to
    /// `Other` rather than erroring: the message is still logged.
    pub fn classify(value: &Value) -> InboundEvent {
        match value.get("type").and_then(Value::as_str) {
            Some("response.done") => serde_json::from_value(value.clone())
                .map(InboundEvent::ResponseDone)
                .unwrap_or(InboundEvent::Other),
            Some("tool_call") => serde_json::from_value(value.clone())
                .map(InboundEvent::ToolCall)
                .unwrap_or(InboundEvent::Other),
            _ => InboundEvent::Other,
        }
    }
}

/// Body of a `response.done` event.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseDonePayload {
    /// Completed response
    #[serde(default)]
    pub response: ResponseBody,
}

/// The `response` object inside a completed-response event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseBody {
    /// Output entries; function calls appear here. Kept raw so each entry is
    /// extracted independently and a malformed one cannot sink its siblings.
    #[serde(default)]
    pub output: Vec<Value>,
}

/// One entry in a completed response's output list.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    /// Entry kind ("function_call", "message", ...)
    #[serde(rename = "type")]
    pub item_type: String,
    /// Function name for function_call entries
    #[serde(default)]
    pub name: Option<String>,
    /// Raw argument string for function_call entries
    #[serde(default)]
    pub arguments: Option<String>,
    /// Correlation identifier, if the remote side provided one
    #[serde(default)]
    pub call_id: Option<String>,
}

/// Body of a standalone `tool_call` event.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallPayload {
    /// Tool name and arguments
    pub tool: ToolCallBody,
    /// Correlation identifier, if provided
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

/// The `tool` object inside a standalone tool-call event.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallBody {
    /// Tool name
    pub name: String,
    /// Raw argument string
    #[serde(default)]
    pub arguments: String,
}

// =============================================================================
// Tool Invocations
// =============================================================================

/// Where a tool invocation was found in the inbound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// Top-level `tool_call` event
    Direct,
    /// `function_call` entry inside a completed-response payload
    Embedded,
}

/// A transient retrieval request extracted from an inbound event.
///
/// One inbound event may yield zero, one or many invocations (the embedded
/// case can carry several function calls in a single output list).
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Where the invocation came from
    pub kind: InvocationKind,
    /// Tool name
    pub name: String,
    /// Raw argument string, expected to parse as a query object
    pub arguments: String,
    /// Correlation identifier; generated when the source event lacks one
    pub call_id: String,
}

impl ToolInvocation {
    /// Extract an invocation from one raw output entry.
    ///
    /// Entries are independent: one that fails typed extraction (the output
    /// vocabulary is open-ended) is skipped without affecting its siblings.
    pub fn from_output_entry(entry: &Value) -> Option<Self> {
        let item: OutputItem = serde_json::from_value(entry.clone()).ok()?;
        Self::from_output_item(&item)
    }

    /// Extract an invocation from an embedded output entry.
    ///
    /// Returns `None` for entries that are not function calls or have no name.
    pub fn from_output_item(item: &OutputItem) -> Option<Self> {
        if item.item_type != "function_call" {
            return None;
        }
        let name = item.name.clone()?;
        Some(Self {
            kind: InvocationKind::Embedded,
            name,
            arguments: item.arguments.clone().unwrap_or_default(),
            call_id: item
                .call_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        })
    }

    /// Extract the invocation from a standalone tool-call event.
    pub fn from_tool_call(payload: &ToolCallPayload) -> Self {
        Self {
            kind: InvocationKind::Direct,
            name: payload.tool.name.clone(),
            arguments: payload.tool.arguments.clone(),
            call_id: payload
                .tool_call_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }
}

/// Query object expected inside tool-call argument strings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalQuery {
    /// Free-text retrieval query
    pub query: String,
}

// =============================================================================
// Tests
// =============================================================================
