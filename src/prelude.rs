//! Convenience re-exports for common use.

pub use crate::adapter::{adapt_messages, MessageWindow, DEFAULT_WINDOW_SIZE};
pub use crate::agent::{AgentConfig, ChatAgent, InvokeAgent, InvokeOnlyAgent, StreamAgent};
pub use crate::config::ChainstreamConfig;
pub use crate::error::{ChainstreamError, Result};
pub use crate::executor::{GraphExecutor, RawEventStream, ReplayExecutor};
pub use crate::interpreter::{AgentEventStream, EventInterpreter};
pub use crate::store::{InMemorySessionStore, SessionStore};
pub use crate::trace::{RecordingTraceSink, TraceSink};
pub use crate::types::{
    AgentStreamingEvent, AgentStreamingEventType, ModelMessage, RawEvent, Role, SessionMessage,
    SessionRole,
};
