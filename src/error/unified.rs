//! Error classification.

use serde::{Deserialize, Serialize};

/// Broad error category for routing failures to the right owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The executor's event stream failed.
    Upstream,
    Store,
    Configuration,
    TraceSink,
    /// The executor's events did not follow the expected protocol.
    Protocol,
    Io,
    Serialization,
    Network,
}
