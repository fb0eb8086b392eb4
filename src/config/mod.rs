//! Configuration system (layered: defaults < TOML file < environment).

use std::path::Path;
use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::adapter::MessageWindow;
use crate::agent::AgentConfig;
use crate::error::{ChainstreamError, Result};
use crate::trace::{IngestionTraceSink, TraceConfig, TraceSink};

/// Agent name used when none is configured.
pub const DEFAULT_AGENT_NAME: &str = "qa-agent";

const ENV_AGENT_NAME: &str = "CHAINSTREAM_AGENT_NAME";
const ENV_SYSTEM_PROMPT: &str = "CHAINSTREAM_SYSTEM_PROMPT";
const ENV_WINDOW_SIZE: &str = "CHAINSTREAM_WINDOW_SIZE";
const ENV_TRACE_HOST: &str = "LANGFUSE_HOST";
const ENV_TRACE_PUBLIC_KEY: &str = "LANGFUSE_PUBLIC_KEY";
const ENV_TRACE_SECRET_KEY: &str = "LANGFUSE_SECRET_KEY";
const ENV_TRACE_NAME: &str = "LANGFUSE_TRACE_NAME";

fn load_dotenv() {
    let _ = dotenvy::dotenv(); // load .env if present, ignore error
}

fn default_agent_name() -> String {
    DEFAULT_AGENT_NAME.to_string()
}

/// Runtime configuration.
///
/// ```toml
/// agent_name = "qa-agent"
/// window_size = "all"
///
/// [trace]
/// host = "https://cloud.langfuse.com"
/// public_key = "pk-…"
/// secret_key = "sk-…"
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct ChainstreamConfig {
    #[builder(into, default = default_agent_name())]
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    #[builder(into, default)]
    #[serde(default)]
    pub system_prompt: String,
    #[builder(default)]
    #[serde(default)]
    pub window_size: MessageWindow,
    /// Trace sink settings; `None` disables span recording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceConfig>,
}

impl Default for ChainstreamConfig {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            system_prompt: String::new(),
            window_size: MessageWindow::default(),
            trace: None,
        }
    }
}

impl ChainstreamConfig {
    /// Defaults overridden by environment variables (`.env` honored).
    pub fn from_env() -> Result<Self> {
        load_dotenv();
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// File (when given) overridden by environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        load_dotenv();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_env()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn merge_env(&mut self) -> Result<()> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(ENV_AGENT_NAME) {
            self.agent_name = name;
        }
        if let Some(prompt) = lookup(ENV_SYSTEM_PROMPT) {
            self.system_prompt = prompt;
        }
        if let Some(window) = lookup(ENV_WINDOW_SIZE) {
            self.window_size = window.parse().map_err(|_| {
                ChainstreamError::Configuration(format!("{ENV_WINDOW_SIZE}: invalid window size '{window}'"))
            })?;
        }

        let host = lookup(ENV_TRACE_HOST);
        let public_key = lookup(ENV_TRACE_PUBLIC_KEY);
        let secret_key = lookup(ENV_TRACE_SECRET_KEY);
        let trace_name = lookup(ENV_TRACE_NAME);
        match &mut self.trace {
            Some(trace) => {
                if let Some(host) = host {
                    trace.host = host;
                }
                if let Some(key) = public_key {
                    trace.public_key = key;
                }
                if let Some(key) = secret_key {
                    trace.secret_key = key;
                }
                if trace_name.is_some() {
                    trace.trace_name = trace_name;
                }
            }
            None => match (host, public_key, secret_key) {
                (Some(host), Some(public_key), Some(secret_key)) => {
                    self.trace = Some(TraceConfig {
                        host,
                        public_key,
                        secret_key,
                        trace_name,
                    });
                }
                (None, None, None) => {}
                _ => {
                    tracing::warn!(
                        "incomplete trace settings: {ENV_TRACE_HOST}, {ENV_TRACE_PUBLIC_KEY} and {ENV_TRACE_SECRET_KEY} are all required; tracing disabled"
                    );
                }
            },
        }
        Ok(())
    }

    /// Agent identity derived from this configuration.
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig::builder()
            .name(self.agent_name.clone())
            .system_prompt(self.system_prompt.clone())
            .build()
    }

    /// The configured ingestion sink, if tracing is enabled.
    pub fn ingestion_sink(&self) -> Result<Option<IngestionTraceSink>> {
        self.trace.as_ref().map(IngestionTraceSink::new).transpose()
    }

    /// The configured trace sink, if tracing is enabled.
    pub fn trace_sink(&self) -> Result<Option<Arc<dyn TraceSink>>> {
        Ok(self
            .ingestion_sink()?
            .map(|sink| Arc::new(sink) as Arc<dyn TraceSink>))
    }
}
