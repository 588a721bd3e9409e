//! Bus topics and the typed messages carried on them.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::event::{GameEventPayload, NotificationEvent};

/// A named channel on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum Topic {
    /// A producer reports something that happened in the game.
    GameEvent,
    /// The user opened the log panel.
    LogOpened,
    /// An event left the display slot and belongs in the durable log.
    AddToLog,
    /// The user clicked the log icon on the presentation surface.
    LogIconClicked,
}

impl Topic {
    /// Every topic, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::GameEvent,
        Self::LogOpened,
        Self::AddToLog,
        Self::LogIconClicked,
    ];

    /// Wire name of the topic.
    pub const fn name(self) -> &'static str {
        match self {
            Self::GameEvent => "gameEvent",
            Self::LogOpened => "logOpened",
            Self::AddToLog => "addToLog",
            Self::LogIconClicked => "logIconClicked",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no known topic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topic: {0:?}")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|topic| topic.name() == s)
            .ok_or_else(|| UnknownTopic(s.to_owned()))
    }
}

/// A message published on the bus, one variant per [`Topic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum BusMessage {
    /// Ingress: a new game event.
    GameEvent(GameEventPayload),
    /// Ingress: the log panel was opened.
    LogOpened,
    /// Egress: an event demoted into the log.
    AddToLog(NotificationEvent),
    /// Egress: the log icon was clicked.
    LogIconClicked,
}

impl BusMessage {
    /// The topic this message is delivered on.
    pub const fn topic(&self) -> Topic {
        match self {
            Self::GameEvent(_) => Topic::GameEvent,
            Self::LogOpened => Topic::LogOpened,
            Self::AddToLog(_) => Topic::AddToLog,
            Self::LogIconClicked => Topic::LogIconClicked,
        }
    }

    /// Convenience constructor for a `gameEvent` message.
    pub fn game_event(payload: impl Into<GameEventPayload>) -> Self {
        Self::GameEvent(payload.into())
    }
}
