//! Streaming-capable agent.

use std::sync::Arc;

use async_trait::async_trait;

use super::{AgentConfig, AgentContext, InvokeAgent, StreamAgent};
use crate::adapter::MessageWindow;
use crate::error::Result;
use crate::executor::GraphExecutor;
use crate::interpreter::{AgentEventStream, EventInterpreter};
use crate::store::SessionStore;
use crate::trace::TraceSink;

/// Agent answering a chat session either as a live event stream or as a
/// single final text. Tool spans are recorded only while streaming.
#[derive(Debug, Clone)]
pub struct ChatAgent {
    context: AgentContext,
    interpreter: EventInterpreter,
}

impl ChatAgent {
    pub fn new(
        config: AgentConfig,
        executor: Arc<dyn GraphExecutor>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let interpreter = EventInterpreter::new(config.name.clone());
        Self {
            context: AgentContext {
                config,
                executor,
                store,
            },
            interpreter,
        }
    }

    pub fn with_trace_sink(mut self, sink: Option<Arc<dyn TraceSink>>) -> Self {
        self.interpreter = self.interpreter.with_optional_trace_sink(sink);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.context.config
    }
}

#[async_trait]
impl InvokeAgent for ChatAgent {
    fn name(&self) -> &str {
        &self.context.config.name
    }

    async fn invoke(&self, session_id: &str, window: MessageWindow) -> Result<String> {
        let messages = self.context.prepare_messages(session_id, window).await?;
        tracing::info!(agent = %self.name(), session_id, messages = messages.len(), "invoking agent");
        self.interpreter
            .invoke(self.context.executor.as_ref(), messages)
            .await
    }
}

#[async_trait]
impl StreamAgent for ChatAgent {
    async fn stream(&self, session_id: &str, window: MessageWindow) -> Result<AgentEventStream> {
        let messages = self.context.prepare_messages(session_id, window).await?;
        tracing::info!(agent = %self.name(), session_id, messages = messages.len(), "streaming agent");
        self.interpreter
            .stream(self.context.executor.as_ref(), messages)
            .await
    }
}
