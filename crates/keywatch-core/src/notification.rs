//! Messages delivered to the attached watcher.
//!
//! A [`Notification`] is formatted at delivery time from the handed-off
//! key and value plus the store's current overwrite flag for that key.
//! It can be rendered either as the plain text line sent to watchers by
//! default or as a JSON object (see [`WatchFormat`]).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a notification describes a first write or an overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The key had never been overwritten when the watcher received the event.
    Created,
    /// The key had been overwritten at least once when the watcher received
    /// the event.
    Updated,
}

/// A formatted mutation message for the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// First write or update.
    pub kind: ChangeKind,
    /// The key that was written.
    pub key: String,
    /// The written value, rendered as lossy UTF-8.
    pub value: String,
}

impl Notification {
    /// Build a notification from a handed-off event.
    pub fn new(kind: ChangeKind, key: String, value: &[u8]) -> Self {
        Self {
            kind,
            key,
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }

    /// Render the notification in the given wire format.
    ///
    /// # Errors
    ///
    /// Returns an error only if JSON serialization fails.
    pub fn render(&self, format: WatchFormat) -> Result<String, serde_json::Error> {
        match format {
            WatchFormat::Text => Ok(self.to_string()),
            WatchFormat::Json => serde_json::to_string(self),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChangeKind::Created => write!(f, "watch: key = {}, val = {}", self.key, self.value),
            ChangeKind::Updated => write!(f, "Updating {} to value = {}", self.key, self.value),
        }
    }
}

/// Wire format of watcher frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchFormat {
    /// One human-readable line per notification.
    #[default]
    Text,
    /// One JSON object per notification.
    Json,
}
