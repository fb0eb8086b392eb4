//! Shared test helpers: scripted executor, event builders, failing sink.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};

use chainstream::error::{ChainstreamError, Result};
use chainstream::executor::{GraphExecutor, RawEventStream};
use chainstream::interpreter::AgentEventStream;
use chainstream::trace::{SpanHandle, SpanStart, TraceSink};
use chainstream::types::{AgentStreamingEvent, ModelMessage, RawEvent};

pub const AGENT: &str = "qa-agent";

/// Executor that replays a fixed script and records what it was asked.
pub struct ScriptedExecutor {
    script: Mutex<Vec<Result<RawEvent>>>,
    requests: Mutex<Vec<Vec<ModelMessage>>>,
    released: Arc<AtomicBool>,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<Result<RawEvent>>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_events(events: Vec<RawEvent>) -> Self {
        Self::new(events.into_iter().map(Ok).collect())
    }

    pub fn last_request(&self) -> Option<Vec<ModelMessage>> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Whether the event stream handed out has been dropped.
    pub fn stream_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl GraphExecutor for ScriptedExecutor {
    async fn stream_events(&self, messages: Vec<ModelMessage>) -> Result<RawEventStream> {
        self.requests.lock().unwrap().push(messages);
        let script = std::mem::take(&mut *self.script.lock().unwrap());
        let flag = ReleaseFlag(Arc::clone(&self.released));
        let stream = async_stream::stream! {
            let _flag = flag;
            for item in script {
                yield item;
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Structured chain output carrying `text` as the first agent message.
pub fn agent_output(text: &str) -> Value {
    json!({"agent": {"messages": [{"content": text, "type": "ai"}]}})
}

/// A representative execution: nested chains, two chunks around a tool call.
pub fn tool_run_script() -> Vec<RawEvent> {
    vec![
        RawEvent::chain_start(AGENT, "run-agent"),
        RawEvent::chain_start("agent", "run-node-1"),
        RawEvent::other("on_chat_model_start", "model", "run-model-1"),
        RawEvent::model_chunk("model", "run-model-1", ""),
        RawEvent::model_chunk("model", "run-model-1", "Let me "),
        RawEvent::model_chunk("model", "run-model-1", "search. "),
        RawEvent::chain_end("agent", "run-node-1", None),
        RawEvent::tool_start("search", "run-tool-1", json!({"query": "rust"})),
        RawEvent::tool_end("search", "run-tool-1", json!({"hits": 3})),
        RawEvent::model_chunk("model", "run-model-2", "Found 3."),
        RawEvent::chain_end(AGENT, "run-agent", Some(agent_output("Let me search. Found 3."))),
    ]
}

pub async fn collect_events(mut stream: AgentEventStream) -> (Vec<AgentStreamingEvent>, Option<ChainstreamError>) {
    let mut events = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => events.push(event),
            Err(err) => return (events, Some(err)),
        }
    }
    (events, None)
}

/// Sink that is configured but cannot open spans.
pub struct UnavailableTraceSink;

impl TraceSink for UnavailableTraceSink {
    fn span(&self, _start: SpanStart) -> Result<Box<dyn SpanHandle>> {
        Err(ChainstreamError::TraceSink("collector unreachable".to_string()))
    }
}
