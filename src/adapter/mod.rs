//! Conversion of persisted session messages into executor messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ChainstreamError, Result};
use crate::store::SessionStore;
use crate::types::{ModelMessage, SessionMessage, SessionRole};

/// Number of most recent messages used when the caller does not say.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// How much of a session's history is fed to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageWindow {
    /// The entire history.
    All,
    /// The most recent `n` messages.
    Last(usize),
}

impl MessageWindow {
    /// The slice of `items` covered by this window, in original order.
    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        match *self {
            Self::All => items,
            // `Last(0)` is an empty window, not the whole history.
            Self::Last(n) => &items[items.len().saturating_sub(n)..],
        }
    }

    /// Window from a signed size where any negative value means "all".
    pub fn from_size(size: i64) -> Self {
        usize::try_from(size).map_or(Self::All, Self::Last)
    }
}

impl Default for MessageWindow {
    fn default() -> Self {
        Self::Last(DEFAULT_WINDOW_SIZE)
    }
}

impl fmt::Display for MessageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Last(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for MessageWindow {
    type Err = ChainstreamError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<i64>()
            .map(Self::from_size)
            .map_err(|_| ChainstreamError::InvalidArgument(format!("invalid window size: '{s}'")))
    }
}

impl Serialize for MessageWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Last(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

impl<'de> Deserialize<'de> for MessageWindow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Size(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Size(size) => Ok(Self::from_size(size)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Content of a user message, with its attachment annotation.
///
/// The annotation is appended with no separator: `"hi"` with files
/// `a.pdf, b.png` becomes `"hiFiles Attached:a.pdf,b.png"`.
pub fn user_content(message: &SessionMessage) -> String {
    match message.files.as_deref() {
        Some(files) if !files.is_empty() => {
            format!("{}Files Attached:{}", message.content, files.join(","))
        }
        _ => message.content.clone(),
    }
}

/// Convert one session message. Roles other than user and assistant yield `None`.
pub fn to_model_message(message: &SessionMessage) -> Option<ModelMessage> {
    match &message.role {
        SessionRole::User => Some(ModelMessage::user(user_content(message))),
        SessionRole::Assistant => Some(ModelMessage::assistant(message.content.clone())),
        SessionRole::Other(_) => None,
    }
}

/// Convert the windowed tail of a history, preserving order.
///
/// The window is taken over the stored messages before unknown roles are
/// dropped, so a dropped message still counts towards the window.
pub fn adapt_messages(messages: &[SessionMessage], window: MessageWindow) -> Vec<ModelMessage> {
    window
        .apply(messages)
        .iter()
        .filter_map(to_model_message)
        .collect()
}

/// Fetch a session's history and convert its windowed tail.
pub async fn messages_for_session(
    store: &dyn SessionStore,
    session_id: &str,
    window: MessageWindow,
) -> Result<Vec<ModelMessage>> {
    let messages = store.find_messages(session_id).await?;
    tracing::debug!(
        session_id,
        stored = messages.len(),
        window = %window,
        "loaded session history"
    );
    Ok(adapt_messages(&messages, window))
}
