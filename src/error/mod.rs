//! Error types for chainstream.

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

/// Primary error type for all chainstream operations.
#[derive(Error, Debug)]
pub enum ChainstreamError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure raised by the graph executor's event stream, surfaced verbatim.
    #[error("Executor error: {0}")]
    Executor(String),

    #[error("Session store error: {0}")]
    Store(String),

    #[error("Trace sink error: {0}")]
    TraceSink(String),

    #[error("Agent '{agent}' finished without a final output")]
    MissingFinalOutput { agent: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ChainstreamError {
    /// Wrap any upstream failure as an executor error.
    pub fn executor(message: impl Into<String>) -> Self {
        Self::Executor(message.into())
    }

    pub fn missing_final_output(agent: impl Into<String>) -> Self {
        Self::MissingFinalOutput {
            agent: agent.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Executor(_) => ErrorCategory::Upstream,
            Self::Store(_) => ErrorCategory::Store,
            Self::Configuration(_) | Self::Toml(_) | Self::InvalidArgument(_) => {
                ErrorCategory::Configuration
            }
            Self::TraceSink(_) => ErrorCategory::TraceSink,
            Self::MissingFinalOutput { .. } => ErrorCategory::Protocol,
            Self::Io(_) => ErrorCategory::Io,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Network(_) => ErrorCategory::Network,
        }
    }

    /// Whether the failure originated outside this layer (executor, store, transport).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Upstream | ErrorCategory::Store | ErrorCategory::Network
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ChainstreamError>;
