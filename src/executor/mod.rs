//! Graph executor boundary.
//!
//! The executor runs a compiled graph (model plus tools) over a message list
//! and yields an ordered stream of raw execution events. It is a black box to
//! this crate: no pause, resume or source-side filtering.

use std::path::PathBuf;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;

use crate::error::{ChainstreamError, Result};
use crate::types::{ModelMessage, RawEvent};

/// Single-producer stream of raw events; an `Err` item is an upstream failure.
pub type RawEventStream = BoxStream<'static, Result<RawEvent>>;

/// Something that can run the agent graph.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    /// Start one execution over `messages`.
    async fn stream_events(&self, messages: Vec<ModelMessage>) -> Result<RawEventStream>;
}

/// Executor that replays a recorded execution from a JSON-lines file.
///
/// Each non-blank line is one executor record. Lines that are not event
/// records are logged and skipped. The input messages are not used, which
/// makes the replay deterministic.
#[derive(Debug, Clone)]
pub struct ReplayExecutor {
    path: PathBuf,
}

impl ReplayExecutor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl GraphExecutor for ReplayExecutor {
    async fn stream_events(&self, messages: Vec<ModelMessage>) -> Result<RawEventStream> {
        let file = tokio::fs::File::open(&self.path).await?;
        tracing::debug!(
            path = %self.path.display(),
            messages = messages.len(),
            "replaying recorded execution"
        );

        let mut lines = LinesStream::new(BufReader::new(file).lines());
        let stream = async_stream::stream! {
            let mut line_no = 0usize;
            while let Some(line) = lines.next().await {
                line_no += 1;
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        yield Err(ChainstreamError::executor(format!(
                            "reading event line {line_no}: {err}"
                        )));
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match RawEvent::from_json_str(&line) {
                    Ok(event) => yield Ok(event),
                    Err(err) => {
                        tracing::warn!(line = line_no, error = %err, "skipping malformed event record");
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
