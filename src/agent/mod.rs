//! Agent façades: session lookup, message adaptation and interpretation wired
//! together behind `stream` / `invoke`.

pub mod chat;
pub mod invoke_only;

pub use chat::ChatAgent;
pub use invoke_only::InvokeOnlyAgent;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::adapter::{self, MessageWindow};
use crate::error::Result;
use crate::executor::GraphExecutor;
use crate::interpreter::AgentEventStream;
use crate::store::SessionStore;
use crate::types::ModelMessage;

/// Identity and prompt of a top-level agent.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Run name the executor reports for the top-level chain.
    #[builder(into)]
    pub name: String,
    /// Prepended as a system message when non-empty.
    #[builder(into, default)]
    #[serde(default)]
    pub system_prompt: String,
}

/// An agent that can answer a session with a single final text.
#[async_trait]
pub trait InvokeAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, session_id: &str, window: MessageWindow) -> Result<String>;
}

/// An agent that can also expose its execution as a live event stream.
#[async_trait]
pub trait StreamAgent: InvokeAgent {
    async fn stream(&self, session_id: &str, window: MessageWindow) -> Result<AgentEventStream>;
}

/// Executor, store and configuration shared by the façades.
#[derive(Clone)]
pub(crate) struct AgentContext {
    pub(crate) config: AgentConfig,
    pub(crate) executor: Arc<dyn GraphExecutor>,
    pub(crate) store: Arc<dyn SessionStore>,
}

impl fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AgentContext {
    /// System prompt (if any) followed by the windowed session history.
    pub(crate) async fn prepare_messages(
        &self,
        session_id: &str,
        window: MessageWindow,
    ) -> Result<Vec<ModelMessage>> {
        let history = adapter::messages_for_session(self.store.as_ref(), session_id, window).await?;
        let mut messages = Vec::with_capacity(history.len() + 1);
        if !self.config.system_prompt.is_empty() {
            messages.push(ModelMessage::system(self.config.system_prompt.clone()));
        }
        messages.extend(history);
        Ok(messages)
    }
}
