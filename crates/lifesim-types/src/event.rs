//! Game events flowing into the notification pipeline.
//!
//! Producers publish either a bare string or a `{text, category?}` record
//! on the `gameEvent` topic. Both shapes deserialize into
//! [`GameEventPayload`] and normalize to a [`NotificationEvent`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The unit flowing through the pipeline and into the durable log.
///
/// Never mutated after ingestion. `category` is a presentation hint only;
/// its absence is the normal case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NotificationEvent {
    /// Human-readable message.
    pub text: String,
    /// Optional classification used for styling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub category: Option<String>,
}

impl NotificationEvent {
    /// Create an event with no category.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
        }
    }

    /// Create an event tagged with a presentation category.
    pub fn with_category(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: Some(category.into()),
        }
    }
}

impl From<&str> for NotificationEvent {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for NotificationEvent {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Raw payload of a `gameEvent` message as producers send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum GameEventPayload {
    /// A bare message string.
    Text(String),
    /// A full event record.
    Record(NotificationEvent),
}

impl GameEventPayload {
    /// Normalize the payload into an event. A bare string has no category.
    pub fn into_event(self) -> NotificationEvent {
        match self {
            Self::Text(text) => NotificationEvent::new(text),
            Self::Record(event) => event,
        }
    }
}

impl From<NotificationEvent> for GameEventPayload {
    fn from(event: NotificationEvent) -> Self {
        Self::Record(event)
    }
}

impl From<&str> for GameEventPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}
