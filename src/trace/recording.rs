//! In-memory trace sink.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{SpanEnd, SpanHandle, SpanStart, TraceSink};
use crate::error::Result;

/// One recorded span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanRecord {
    pub name: String,
    pub input: Value,
    pub output: Option<Value>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Closed because its pass went away before the tool finished.
    pub abandoned: bool,
}

impl SpanRecord {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}

/// Sink that keeps every span in memory. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct RecordingTraceSink {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl RecordingTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SpanRecord>> {
        self.spans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of all spans in creation order.
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.lock().clone()
    }

    pub fn open_spans(&self) -> Vec<SpanRecord> {
        self.lock().iter().filter(|s| s.is_open()).cloned().collect()
    }

    pub fn closed_spans(&self) -> Vec<SpanRecord> {
        self.lock().iter().filter(|s| !s.is_open()).cloned().collect()
    }
}

impl TraceSink for RecordingTraceSink {
    fn span(&self, start: SpanStart) -> Result<Box<dyn SpanHandle>> {
        let mut spans = self.lock();
        spans.push(SpanRecord {
            name: start.name,
            input: start.input,
            output: None,
            start_time: start.start_time,
            end_time: None,
            abandoned: false,
        });
        Ok(Box::new(RecordingSpan {
            index: spans.len() - 1,
            spans: Arc::clone(&self.spans),
        }))
    }
}

struct RecordingSpan {
    index: usize,
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl RecordingSpan {
    fn finish(&self, end_time: DateTime<Utc>, output: Value, abandoned: bool) {
        let mut spans = self
            .spans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(record) = spans.get_mut(self.index) {
            record.end_time = Some(end_time);
            record.output = Some(output);
            record.abandoned = abandoned;
        }
    }
}

impl SpanHandle for RecordingSpan {
    fn update(&mut self, end: SpanEnd) -> Result<()> {
        self.finish(end.end_time, end.output, false);
        Ok(())
    }

    fn abandon(&mut self, end_time: DateTime<Utc>) -> Result<()> {
        self.finish(end_time, Value::Null, true);
        Ok(())
    }
}
