//! Tests for replaying recorded executions from JSON-lines files.

use std::io::Write;

use futures::StreamExt;
use pretty_assertions::assert_eq;

use chainstream::executor::{GraphExecutor, ReplayExecutor};
use chainstream::interpreter::EventInterpreter;
use chainstream::trace::RecordingTraceSink;
use chainstream::types::{AgentStreamingEvent, RawEventKind};
use std::sync::Arc;

const RECORDING: &str = r#"{"event": "on_chain_start", "name": "qa-agent", "run_id": "a", "data": {"input": {"messages": []}}}
{"event": "on_chat_model_stream", "name": "model", "run_id": "m", "data": {"chunk": {"content": "Checking. "}}}

not a record
{"name": "no-kind"}
{"event": "on_tool_start", "name": "search", "run_id": "t", "data": {"input": {"query": "q"}}}
{"event": "on_tool_end", "name": "search", "run_id": "t", "data": {"output": "2 hits"}}
{"event": "on_chat_model_stream", "name": "model", "run_id": "m2", "data": {"chunk": {"content": [{"type": "text", "text": "Done."}]}}}
{"event": "on_chain_end", "name": "qa-agent", "run_id": "a", "data": {"output": {"agent": {"messages": [{"content": "Checking. Done."}]}}}}
"#;

fn recording() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(RECORDING.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn replay_skips_blank_and_malformed_lines() {
    let file = recording();
    let executor = ReplayExecutor::new(file.path());

    let kinds: Vec<RawEventKind> = executor
        .stream_events(Vec::new())
        .await
        .unwrap()
        .map(|event| event.unwrap().kind())
        .collect()
        .await;

    assert_eq!(
        kinds,
        vec![
            RawEventKind::ChainStart,
            RawEventKind::ModelStream,
            RawEventKind::ToolStart,
            RawEventKind::ToolEnd,
            RawEventKind::ModelStream,
            RawEventKind::ChainEnd,
        ]
    );
}

#[tokio::test]
async fn replayed_execution_streams_normalized_events() {
    let file = recording();
    let executor = ReplayExecutor::new(file.path());
    let sink = RecordingTraceSink::new();
    let interpreter = EventInterpreter::new("qa-agent").with_trace_sink(Arc::new(sink.clone()));

    let events: Vec<AgentStreamingEvent> = interpreter
        .stream(&executor, Vec::new())
        .await
        .unwrap()
        .map(|event| event.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 6);
    assert_eq!(
        events.last(),
        Some(&AgentStreamingEvent::ChainEnd {
            name: "qa-agent".into(),
            output: "Checking. Done.".into(),
        })
    );
    assert_eq!(sink.closed_spans().len(), 1);
}

#[tokio::test]
async fn replayed_execution_invokes_to_structured_output() {
    let file = recording();
    let executor = ReplayExecutor::new(file.path());

    let answer = EventInterpreter::new("qa-agent")
        .invoke(&executor, Vec::new())
        .await
        .unwrap();

    assert_eq!(answer, "Checking. Done.");
}

#[tokio::test]
async fn missing_recording_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ReplayExecutor::new(dir.path().join("absent.jsonl"));

    let result = executor.stream_events(Vec::new()).await;

    assert!(matches!(result, Err(chainstream::error::ChainstreamError::Io(_))));
}
