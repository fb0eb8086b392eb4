//! Translation of raw executor events into the normalized event protocol.
//!
//! One dispatch table serves both execution modes. A [`PassMode`] decides
//! whether normalized events are emitted and where the final text comes from:
//!
//! | mode        | emits events | final text                                 | spans |
//! |-------------|--------------|--------------------------------------------|-------|
//! | `Streaming` | yes          | accumulated model chunks, on chain end     | yes   |
//! | `Blocking`  | no           | executor's structured output, ends the pass | no    |

use std::sync::Arc;

use chrono::Utc;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;

use crate::error::{ChainstreamError, Result};
use crate::executor::{GraphExecutor, RawEventStream};
use crate::trace::{SpanCorrelator, TraceSink};
use crate::types::{structured_output_text, AgentStreamingEvent, ModelMessage, RawEvent, RawEventData};

/// Lazy, single-pass stream of normalized events.
pub type AgentEventStream = BoxStream<'static, Result<AgentStreamingEvent>>;

/// Where a pass takes its final answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalTextSource {
    /// Concatenation of every non-empty model chunk seen so far.
    Accumulator,
    /// First result message of the top-level chain's structured output.
    StructuredOutput,
}

/// Execution mode of an interpretation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    Streaming,
    Blocking,
}

impl PassMode {
    pub fn emits_events(self) -> bool {
        matches!(self, Self::Streaming)
    }

    pub fn final_text_source(self) -> FinalTextSource {
        match self {
            Self::Streaming => FinalTextSource::Accumulator,
            Self::Blocking => FinalTextSource::StructuredOutput,
        }
    }
}

/// Outcome of dispatching one raw event.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Nothing for the caller.
    Continue,
    Emit(AgentStreamingEvent),
    /// The top-level chain ended in blocking mode; the pass is over.
    Finish(Option<String>),
}

/// State of one execution: accumulator and span registry.
///
/// Never shared between executions; create a new pass per run.
#[derive(Debug)]
pub struct InterpretationPass {
    agent_name: String,
    mode: PassMode,
    accumulated: String,
    spans: SpanCorrelator,
}

impl InterpretationPass {
    /// Pass that emits events and correlates tool spans into `sink`.
    pub fn streaming(agent_name: impl Into<String>, sink: Option<Arc<dyn TraceSink>>) -> Self {
        Self {
            agent_name: agent_name.into(),
            mode: PassMode::Streaming,
            accumulated: String::new(),
            spans: SpanCorrelator::new(sink),
        }
    }

    /// Pass that emits nothing and has no trace sink.
    pub fn blocking(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            mode: PassMode::Blocking,
            accumulated: String::new(),
            spans: SpanCorrelator::disabled(),
        }
    }

    pub fn mode(&self) -> PassMode {
        self.mode
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Model text accumulated so far.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    pub fn open_spans(&self) -> usize {
        self.spans.open_count()
    }

    fn emit(&self, event: AgentStreamingEvent) -> Step {
        if self.mode.emits_events() {
            Step::Emit(event)
        } else {
            Step::Continue
        }
    }

    /// Apply one raw event to the pass.
    pub fn dispatch(&mut self, event: RawEvent) -> Step {
        let RawEvent { name, run_id, data } = event;
        match data {
            RawEventData::ChainStart { .. } if name == self.agent_name => {
                tracing::info!(agent = %name, "starting agent");
                self.emit(AgentStreamingEvent::ChainStart { name })
            }
            RawEventData::ChainEnd { output } if name == self.agent_name => {
                match self.mode.final_text_source() {
                    FinalTextSource::Accumulator => {
                        tracing::info!(
                            agent = %name,
                            output_len = self.accumulated.len(),
                            "agent finished"
                        );
                        let output = self.accumulated.clone();
                        self.emit(AgentStreamingEvent::ChainEnd { name, output })
                    }
                    FinalTextSource::StructuredOutput => {
                        tracing::info!(agent = %name, output = ?output, "agent finished");
                        Step::Finish(output.as_ref().and_then(structured_output_text))
                    }
                }
            }
            RawEventData::ModelChunk { text } => {
                if text.is_empty() {
                    return Step::Continue;
                }
                self.accumulated.push_str(&text);
                self.emit(AgentStreamingEvent::Message { content: text })
            }
            RawEventData::ToolStart { input } => {
                let input = input.unwrap_or(Value::Null);
                tracing::info!(tool = %name, run_id = %run_id, input = %input, "starting tool");
                self.spans.open(&run_id, &name, input.clone(), Utc::now());
                self.emit(AgentStreamingEvent::ToolStart { name, input })
            }
            RawEventData::ToolEnd { output } => {
                let output = output.unwrap_or(Value::Null);
                tracing::info!(tool = %name, run_id = %run_id, output = %output, "tool finished");
                if !self.spans.close(&run_id, Utc::now(), output.clone()) && self.spans.is_tracing() {
                    tracing::warn!(tool = %name, run_id = %run_id, "tool ended without an open span");
                }
                self.emit(AgentStreamingEvent::ToolEnd { name, output })
            }
            RawEventData::ChainStart { .. } | RawEventData::ChainEnd { .. } => {
                tracing::debug!(chain = %name, "ignoring nested chain event");
                Step::Continue
            }
            RawEventData::Other { event, .. } => {
                tracing::debug!(kind = %event, emitter = %name, "ignoring event");
                Step::Continue
            }
        }
    }
}

/// Drive a streaming pass over a raw event stream.
///
/// Upstream failures are yielded once and end the stream; events already
/// yielded stand. Dropping the returned stream drops the pass, which closes
/// any span still open.
pub fn drive_streaming(pass: InterpretationPass, events: RawEventStream) -> AgentEventStream {
    let stream = async_stream::stream! {
        let mut pass = pass;
        let mut events = events;
        while let Some(item) = events.next().await {
            match item {
                Ok(raw) => {
                    if let Step::Emit(event) = pass.dispatch(raw) {
                        yield Ok(event);
                    }
                }
                Err(err) => {
                    tracing::warn!(agent = %pass.agent_name(), error = %err, "executor stream failed");
                    yield Err(err);
                    break;
                }
            }
        }
    };
    Box::pin(stream)
}

/// Drive a blocking pass until the top-level chain ends.
pub async fn drive_blocking(mut pass: InterpretationPass, mut events: RawEventStream) -> Result<String> {
    while let Some(item) = events.next().await {
        if let Step::Finish(text) = pass.dispatch(item?) {
            return text.ok_or_else(|| ChainstreamError::missing_final_output(pass.agent_name()));
        }
    }
    Err(ChainstreamError::missing_final_output(pass.agent_name()))
}

/// Entry point pairing a top-level agent name with an optional trace sink.
#[derive(Clone)]
pub struct EventInterpreter {
    agent_name: String,
    trace_sink: Option<Arc<dyn TraceSink>>,
}

impl std::fmt::Debug for EventInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventInterpreter")
            .field("agent_name", &self.agent_name)
            .field("trace_sink", &self.trace_sink.as_ref().map(|_| ".."))
            .finish()
    }
}

impl EventInterpreter {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            trace_sink: None,
        }
    }

    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    pub fn with_optional_trace_sink(mut self, sink: Option<Arc<dyn TraceSink>>) -> Self {
        self.trace_sink = sink;
        self
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Interpret an already-started execution in streaming mode.
    pub fn stream_events(&self, events: RawEventStream) -> AgentEventStream {
        let pass = InterpretationPass::streaming(self.agent_name.clone(), self.trace_sink.clone());
        drive_streaming(pass, events)
    }

    /// Interpret an already-started execution in blocking mode.
    pub async fn invoke_events(&self, events: RawEventStream) -> Result<String> {
        drive_blocking(InterpretationPass::blocking(self.agent_name.clone()), events).await
    }

    /// Start the executor and stream normalized events.
    pub async fn stream(
        &self,
        executor: &dyn GraphExecutor,
        messages: Vec<ModelMessage>,
    ) -> Result<AgentEventStream> {
        let events = executor.stream_events(messages).await?;
        Ok(self.stream_events(events))
    }

    /// Start the executor and wait for the final text.
    pub async fn invoke(&self, executor: &dyn GraphExecutor, messages: Vec<ModelMessage>) -> Result<String> {
        let events = executor.stream_events(messages).await?;
        self.invoke_events(events).await
    }
}
