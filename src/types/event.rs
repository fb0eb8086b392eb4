//! Normalized streaming events: the public event protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Kind of a normalized streaming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentStreamingEventType {
    ChainStart,
    ChainEnd,
    Message,
    ToolStart,
    ToolEnd,
}

/// One event of the agent's execution, as seen by a UI.
///
/// Serialized with an internal `type` tag:
/// `{"type": "tool_start", "name": "search", "input": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamingEvent {
    /// The top-level agent started.
    ChainStart { name: String },
    /// The top-level agent finished; `output` is the full streamed response.
    ChainEnd { name: String, output: String },
    /// A non-empty model text delta.
    Message { content: String },
    ToolStart { name: String, input: Value },
    ToolEnd { name: String, output: Value },
}

impl AgentStreamingEvent {
    pub fn event_type(&self) -> AgentStreamingEventType {
        match self {
            Self::ChainStart { .. } => AgentStreamingEventType::ChainStart,
            Self::ChainEnd { .. } => AgentStreamingEventType::ChainEnd,
            Self::Message { .. } => AgentStreamingEventType::Message,
            Self::ToolStart { .. } => AgentStreamingEventType::ToolStart,
            Self::ToolEnd { .. } => AgentStreamingEventType::ToolEnd,
        }
    }

    /// Text delta carried by a `message` event.
    pub fn message_text(&self) -> Option<&str> {
        match self {
            Self::Message { content } => Some(content),
            _ => None,
        }
    }
}
