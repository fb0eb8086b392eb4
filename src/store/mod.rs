//! Session store boundary: lookup of persisted chat messages by session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{ChainstreamError, Result};
use crate::types::SessionMessage;

/// Source of persisted session messages.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// All messages of a session in creation order. Unknown sessions yield an
    /// empty history.
    async fn find_messages(&self, session_id: &str) -> Result<Vec<SessionMessage>>;
}

/// Process-local store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<SessionMessage>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding a single session.
    pub fn with_session(session_id: impl Into<String>, messages: Vec<SessionMessage>) -> Self {
        let store = Self::new();
        store.replace(session_id, messages);
        store
    }

    /// Append a message to a session, creating the session if needed.
    pub fn push(&self, session_id: &str, message: SessionMessage) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }

    /// Replace the whole history of a session.
    pub fn replace(&self, session_id: impl Into<String>, messages: Vec<SessionMessage>) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions.insert(session_id.into(), messages);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_messages(&self, session_id: &str) -> Result<Vec<SessionMessage>> {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }
}

/// Read-only store backed by a JSON file mapping session ids to message arrays.
///
/// ```json
/// {"s-1": [{"role": "user", "content": "hi", "files": ["a.pdf"]}]}
/// ```
///
/// The file is re-read on every lookup so edits are picked up without restart.
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn find_messages(&self, session_id: &str) -> Result<Vec<SessionMessage>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            ChainstreamError::Store(format!("reading {}: {err}", self.path.display()))
        })?;
        let mut sessions: HashMap<String, Vec<SessionMessage>> = serde_json::from_str(&raw)?;
        Ok(sessions.remove(session_id).unwrap_or_default())
    }
}
