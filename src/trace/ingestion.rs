//! HTTP trace sink speaking the Langfuse ingestion API.
//!
//! Every span operation becomes one batch posted to
//! `{host}/api/public/ingestion`. Posts run in the background so the
//! interpretation pass never waits on the network; [`IngestionTraceSink::flush`]
//! waits for everything queued so far.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{SpanEnd, SpanHandle, SpanStart, TraceSink};
use crate::error::{ChainstreamError, Result};

const DEFAULT_TRACE_NAME: &str = "chainstream";

/// Connection settings for the ingestion sink.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    pub host: String,
    pub public_key: String,
    pub secret_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_name: Option<String>,
}

impl fmt::Debug for TraceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceConfig")
            .field("host", &self.host)
            .field("public_key", &self.public_key)
            .field("secret_key", &"..")
            .field("trace_name", &self.trace_name)
            .finish()
    }
}

/// Build the Basic authorization header for a key pair.
pub fn basic_auth_header(public_key: &str, secret_key: &str) -> Result<HeaderValue> {
    let encoded = STANDARD.encode(format!("{public_key}:{secret_key}"));
    HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|e| ChainstreamError::Configuration(format!("invalid trace credentials: {e}")))
}

/// Trace sink posting span events to a Langfuse-compatible endpoint.
///
/// All spans of one sink (and its clones) belong to a single trace. A
/// long-lived agent serving many requests should call
/// [`IngestionTraceSink::with_new_trace`] per request so each gets its own.
#[derive(Clone)]
pub struct IngestionTraceSink {
    inner: Arc<Inner>,
}

struct Inner {
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
    trace_id: String,
    trace_name: String,
    trace_created: AtomicBool,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for IngestionTraceSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionTraceSink")
            .field("endpoint", &self.inner.endpoint)
            .field("trace_id", &self.inner.trace_id)
            .finish()
    }
}

impl IngestionTraceSink {
    pub fn new(config: &TraceConfig) -> Result<Self> {
        let host = config.host.trim_end_matches('/');
        if host.is_empty() {
            return Err(ChainstreamError::Configuration(
                "trace host must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            basic_auth_header(&config.public_key, &config.secret_key)?,
        );

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                endpoint: format!("{host}/api/public/ingestion"),
                headers,
                trace_id: Uuid::new_v4().to_string(),
                trace_name: config
                    .trace_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TRACE_NAME.to_string()),
                trace_created: AtomicBool::new(false),
                pending: Mutex::new(Vec::new()),
            }),
        })
    }

    /// A sink sharing this one's client and credentials but recording into a
    /// fresh trace.
    pub fn with_new_trace(&self) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(Inner {
                client: inner.client.clone(),
                endpoint: inner.endpoint.clone(),
                headers: inner.headers.clone(),
                trace_id: Uuid::new_v4().to_string(),
                trace_name: inner.trace_name.clone(),
                trace_created: AtomicBool::new(false),
                pending: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Identifier of the trace all spans of this sink belong to.
    pub fn trace_id(&self) -> &str {
        &self.inner.trace_id
    }

    /// Wait for every queued delivery to finish.
    pub async fn flush(&self) {
        let pending = {
            let mut pending = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *pending)
        };
        for handle in pending {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "trace delivery task failed");
            }
        }
    }
}

impl Inner {
    fn envelope(event_type: &str, body: Value) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "timestamp": Utc::now().to_rfc3339(),
            "type": event_type,
            "body": body,
        })
    }

    fn dispatch(self: &Arc<Self>, batch: Vec<Value>) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            ChainstreamError::TraceSink("no async runtime to deliver spans on".to_string())
        })?;

        let inner = Arc::clone(self);
        let handle = runtime.spawn(async move {
            let body = json!({ "batch": batch });
            let response = inner
                .client
                .post(&inner.endpoint)
                .headers(inner.headers.clone())
                .json(&body)
                .send()
                .await;
            match response {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => {
                    tracing::warn!(status = resp.status().as_u16(), "trace ingestion rejected batch");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "trace ingestion request failed");
                }
            }
        });

        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
        Ok(())
    }
}

impl TraceSink for IngestionTraceSink {
    fn span(&self, start: SpanStart) -> Result<Box<dyn SpanHandle>> {
        let span_id = Uuid::new_v4().to_string();
        let mut batch = Vec::with_capacity(2);
        if !self.inner.trace_created.swap(true, Ordering::SeqCst) {
            batch.push(Inner::envelope(
                "trace-create",
                json!({
                    "id": self.inner.trace_id,
                    "name": self.inner.trace_name,
                    "timestamp": start.start_time.to_rfc3339(),
                }),
            ));
        }
        batch.push(Inner::envelope(
            "span-create",
            json!({
                "id": span_id,
                "traceId": self.inner.trace_id,
                "name": start.name,
                "startTime": start.start_time.to_rfc3339(),
                "input": start.input,
            }),
        ));
        self.inner.dispatch(batch)?;

        Ok(Box::new(IngestionSpan {
            id: span_id,
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct IngestionSpan {
    id: String,
    inner: Arc<Inner>,
}

impl IngestionSpan {
    fn send_update(&self, end_time: DateTime<Utc>, output: Value, abandoned: bool) -> Result<()> {
        let mut body = json!({
            "id": self.id,
            "traceId": self.inner.trace_id,
            "endTime": end_time.to_rfc3339(),
            "output": output,
        });
        if abandoned {
            body["level"] = json!("WARNING");
            body["statusMessage"] = json!("tool did not finish");
        }
        self.inner
            .dispatch(vec![Inner::envelope("span-update", body)])
    }
}

impl SpanHandle for IngestionSpan {
    fn update(&mut self, end: SpanEnd) -> Result<()> {
        self.send_update(end.end_time, end.output, false)
    }

    fn abandon(&mut self, end_time: DateTime<Utc>) -> Result<()> {
        self.send_update(end_time, Value::Null, true)
    }
}
