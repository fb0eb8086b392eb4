//! Trace sink boundary and span correlation.
//!
//! A trace sink records one span per tool invocation. The sink is an explicit,
//! optional dependency: with no sink configured every span operation is
//! skipped and event emission is unaffected.

pub mod correlator;
pub mod ingestion;
pub mod recording;

pub use correlator::SpanCorrelator;
pub use ingestion::{IngestionTraceSink, TraceConfig};
pub use recording::{RecordingTraceSink, SpanRecord};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Data needed to open a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanStart {
    pub name: String,
    pub input: Value,
    pub start_time: DateTime<Utc>,
}

/// Data recorded when a span is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEnd {
    pub end_time: DateTime<Utc>,
    pub output: Value,
}

/// External trace client.
///
/// Calls must not block on delivery; sinks that talk to a remote service
/// queue their writes.
pub trait TraceSink: Send + Sync {
    /// Open a span and return its handle.
    fn span(&self, start: SpanStart) -> Result<Box<dyn SpanHandle>>;
}

/// An open span.
pub trait SpanHandle: Send {
    /// Finalize the span with its end time and output.
    fn update(&mut self, end: SpanEnd) -> Result<()>;

    /// Finalize a span whose tool never reported completion.
    fn abandon(&mut self, end_time: DateTime<Utc>) -> Result<()> {
        self.update(SpanEnd {
            end_time,
            output: Value::Null,
        })
    }
}
