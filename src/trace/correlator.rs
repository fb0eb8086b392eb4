//! Run-id to open-span registry for one interpretation pass.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{SpanEnd, SpanHandle, SpanStart, TraceSink};

/// Maps tool run identifiers to their open spans.
///
/// A correlator belongs to exactly one pass: run identifiers are only unique
/// within one execution. Dropping the correlator closes whatever is still
/// open, so abandoning a pass never leaves dangling spans.
pub struct SpanCorrelator {
    sink: Option<Arc<dyn TraceSink>>,
    open: HashMap<String, Box<dyn SpanHandle>>,
}

impl fmt::Debug for SpanCorrelator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanCorrelator")
            .field("sink", &self.sink.as_ref().map(|_| ".."))
            .field("open", &self.open.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SpanCorrelator {
    pub fn new(sink: Option<Arc<dyn TraceSink>>) -> Self {
        Self {
            sink,
            open: HashMap::new(),
        }
    }

    /// Correlator that never records anything.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_tracing(&self) -> bool {
        self.sink.is_some()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn is_open(&self, run_id: &str) -> bool {
        self.open.contains_key(run_id)
    }

    /// Open a span for `run_id`. Returns whether a span was registered.
    pub fn open(
        &mut self,
        run_id: &str,
        name: &str,
        input: Value,
        start_time: DateTime<Utc>,
    ) -> bool {
        let Some(sink) = &self.sink else {
            return false;
        };

        let start = SpanStart {
            name: name.to_string(),
            input,
            start_time,
        };
        let handle = match sink.span(start) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(run_id, tool = name, error = %err, "trace sink rejected span");
                return false;
            }
        };

        if let Some(mut previous) = self.open.insert(run_id.to_string(), handle) {
            tracing::warn!(run_id, "run id reused while its span was open");
            if let Err(err) = previous.abandon(start_time) {
                tracing::warn!(run_id, error = %err, "failed to close replaced span");
            }
        }
        true
    }

    /// Close and forget the span for `run_id`. Absent ids are a no-op.
    pub fn close(&mut self, run_id: &str, end_time: DateTime<Utc>, output: Value) -> bool {
        let Some(mut handle) = self.open.remove(run_id) else {
            return false;
        };
        if let Err(err) = handle.update(SpanEnd { end_time, output }) {
            tracing::warn!(run_id, error = %err, "failed to close span");
        }
        true
    }

    /// Close every open span as abandoned.
    pub fn abandon_all(&mut self) {
        if self.open.is_empty() {
            return;
        }
        let now = Utc::now();
        for (run_id, mut handle) in self.open.drain() {
            tracing::warn!(run_id = %run_id, "closing span of unfinished tool");
            if let Err(err) = handle.abandon(now) {
                tracing::warn!(run_id = %run_id, error = %err, "failed to close abandoned span");
            }
        }
    }
}

impl Drop for SpanCorrelator {
    fn drop(&mut self) {
        self.abandon_all();
    }
}
