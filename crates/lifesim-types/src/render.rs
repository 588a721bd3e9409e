//! Render commands sent one-way from the pipeline to the presentation surface.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::event::NotificationEvent;

/// What the unread badge should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum BadgeDisplay {
    /// No badge.
    Hidden,
    /// Badge text, already saturated (e.g. `"7"` or `"99+"`).
    Count(String),
}

/// A fire-and-forget instruction for the presentation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum RenderCommand {
    /// Show the event in the display slot.
    Show(NotificationEvent),
    /// Start the departure animation of the shown event.
    BeginDeparture,
    /// The display slot is now empty.
    ClearSlot,
    /// Update the unread badge.
    SetBadge(BadgeDisplay),
}
