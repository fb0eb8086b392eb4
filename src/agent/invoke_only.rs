//! Agent that only supports blocking invocation.

use std::sync::Arc;

use async_trait::async_trait;

use super::{AgentConfig, AgentContext, InvokeAgent};
use crate::adapter::MessageWindow;
use crate::error::Result;
use crate::executor::GraphExecutor;
use crate::interpreter::EventInterpreter;
use crate::store::SessionStore;

/// Agent for callers that need only the final answer, e.g. report generation.
#[derive(Debug, Clone)]
pub struct InvokeOnlyAgent {
    context: AgentContext,
    interpreter: EventInterpreter,
}

impl InvokeOnlyAgent {
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
}

#[async_trait]
impl InvokeAgent for InvokeOnlyAgent {
    fn name(&self) -> &str {
        &self.context.config.name
    }

    async fn invoke(&self, session_id: &str, window: MessageWindow) -> Result<String> {
        let messages = self.context.prepare_messages(session_id, window).await?;
        tracing::info!(agent = %self.name(), session_id, "invoking agent");
        self.interpreter
            .invoke(self.context.executor.as_ref(), messages)
            .await
    }
}
