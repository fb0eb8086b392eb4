//! Raw execution events as produced by the graph executor.
//!
//! The executor speaks a loosely-typed record format:
//!
//! ```json
//! {"event": "on_tool_start", "name": "search", "run_id": "4f0c…", "data": {"input": {"query": "rust"}}}
//! ```
//!
//! Records are parsed once, here, into [`RawEvent`] whose payload is a closed
//! sum type keyed by kind. Kinds the interpreter does not act on are kept as
//! [`RawEventData::Other`] so that new executor event kinds never fail parsing.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use strum::EnumString;

/// Event kind discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum RawEventKind {
    #[strum(serialize = "on_chain_start")]
    ChainStart,
    #[strum(serialize = "on_chain_end")]
    ChainEnd,
    #[strum(serialize = "on_chat_model_stream")]
    ModelStream,
    #[strum(serialize = "on_tool_start")]
    ToolStart,
    #[strum(serialize = "on_tool_end")]
    ToolEnd,
    #[strum(default)]
    Other(String),
}

impl RawEventKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChainStart => "on_chain_start",
            Self::ChainEnd => "on_chain_end",
            Self::ModelStream => "on_chat_model_stream",
            Self::ToolStart => "on_tool_start",
            Self::ToolEnd => "on_tool_end",
            Self::Other(kind) => kind,
        }
    }
}

impl fmt::Display for RawEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a raw event.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEventData {
    ChainStart { input: Option<Value> },
    /// `output` is the executor's own structured output for the chain.
    ChainEnd { output: Option<Value> },
    /// Text carried by one model stream chunk; may be empty.
    ModelChunk { text: String },
    ToolStart { input: Option<Value> },
    ToolEnd { output: Option<Value> },
    Other { event: String, data: Value },
}

/// One execution event.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Name of the emitter (agent, nested chain, model or tool).
    pub name: String,
    /// Identifies one invocation of the emitter within one execution.
    pub run_id: String,
    pub data: RawEventData,
}

/// A record that could not be interpreted as an execution event at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedEvent {
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("event record is missing the `event` discriminator")]
    MissingKind,
}

#[derive(Deserialize)]
struct WireEvent {
    event: Option<String>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    run_id: Option<Value>,
    #[serde(default)]
    data: Value,
}

impl RawEvent {
    pub fn new(name: impl Into<String>, run_id: impl Into<String>, data: RawEventData) -> Self {
        Self {
            name: name.into(),
            run_id: run_id.into(),
            data,
        }
    }

    pub fn chain_start(name: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self::new(name, run_id, RawEventData::ChainStart { input: None })
    }

    pub fn chain_end(
        name: impl Into<String>,
        run_id: impl Into<String>,
        output: Option<Value>,
    ) -> Self {
        Self::new(name, run_id, RawEventData::ChainEnd { output })
    }

    pub fn model_chunk(
        name: impl Into<String>,
        run_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(name, run_id, RawEventData::ModelChunk { text: text.into() })
    }

    pub fn tool_start(name: impl Into<String>, run_id: impl Into<String>, input: Value) -> Self {
        Self::new(name, run_id, RawEventData::ToolStart { input: Some(input) })
    }

    pub fn tool_end(name: impl Into<String>, run_id: impl Into<String>, output: Value) -> Self {
        Self::new(name, run_id, RawEventData::ToolEnd { output: Some(output) })
    }

    pub fn other(
        event: impl Into<String>,
        name: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            run_id,
            RawEventData::Other {
                event: event.into(),
                data: Value::Null,
            },
        )
    }

    /// Kind discriminator of this event.
    pub fn kind(&self) -> RawEventKind {
        match &self.data {
            RawEventData::ChainStart { .. } => RawEventKind::ChainStart,
            RawEventData::ChainEnd { .. } => RawEventKind::ChainEnd,
            RawEventData::ModelChunk { .. } => RawEventKind::ModelStream,
            RawEventData::ToolStart { .. } => RawEventKind::ToolStart,
            RawEventData::ToolEnd { .. } => RawEventKind::ToolEnd,
            RawEventData::Other { event, .. } => RawEventKind::Other(event.clone()),
        }
    }

    /// Parse one executor record.
    pub fn from_value(value: Value) -> Result<Self, MalformedEvent> {
        let wire: WireEvent =
            serde_json::from_value(value).map_err(|e| MalformedEvent::Json(e.to_string()))?;
        let event = wire.event.ok_or(MalformedEvent::MissingKind)?;
        let mut data = wire.data;

        let payload = match RawEventKind::from_str(&event) {
            Ok(RawEventKind::ChainStart) => RawEventData::ChainStart {
                input: take_field(&mut data, "input"),
            },
            Ok(RawEventKind::ChainEnd) => RawEventData::ChainEnd {
                output: take_field(&mut data, "output"),
            },
            Ok(RawEventKind::ModelStream) => RawEventData::ModelChunk {
                text: data.get("chunk").map(chunk_text).unwrap_or_default(),
            },
            Ok(RawEventKind::ToolStart) => RawEventData::ToolStart {
                input: take_field(&mut data, "input"),
            },
            Ok(RawEventKind::ToolEnd) => RawEventData::ToolEnd {
                output: take_field(&mut data, "output"),
            },
            Ok(RawEventKind::Other(_)) | Err(_) => RawEventData::Other { event, data },
        };

        Ok(Self {
            name: wire.name.as_ref().map(value_to_id).unwrap_or_default(),
            run_id: wire.run_id.as_ref().map(value_to_id).unwrap_or_default(),
            data: payload,
        })
    }

    /// Parse one executor record from its JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, MalformedEvent> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| MalformedEvent::Json(e.to_string()))?;
        Self::from_value(value)
    }
}

fn take_field(data: &mut Value, key: &str) -> Option<Value> {
    data.as_object_mut()
        .and_then(|map| map.remove(key))
        .filter(|value| !value.is_null())
}

fn value_to_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Text of a model stream chunk.
///
/// Chunks carry either a plain string `content` or a list of content parts,
/// in which case the `text` of every part is concatenated.
fn chunk_text(chunk: &Value) -> String {
    match chunk {
        Value::String(s) => s.clone(),
        Value::Object(map) => map.get("content").map(content_text).unwrap_or_default(),
        _ => String::new(),
    }
}

fn content_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(s) => Some(s.as_str()),
                Value::Object(map) => map.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect(),
        _ => String::new(),
    }
}

/// Content of the first result message in a chain's structured output.
///
/// The executor reports the agent node's state as
/// `{"agent": {"messages": [{"content": …}, …]}}`.
pub fn structured_output_text(output: &Value) -> Option<String> {
    output
        .pointer("/agent/messages/0/content")
        .filter(|content| content.is_string() || content.is_array())
        .map(content_text)
}
