//! Shared type definitions for the Lifesim notification pipeline.
//!
//! Types defined here cross every seam of the workspace: the bus, the
//! pipeline, the presentation surface and the log store. They flow
//! downstream to `TypeScript` via `ts-rs` for the browser front end.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers
//! - [`event`] -- Notification events and raw `gameEvent` payloads
//! - [`message`] -- Bus topics and typed bus messages
//! - [`render`] -- Render commands for the presentation surface

pub mod event;
pub mod ids;
pub mod message;
pub mod render;

pub use event::{GameEventPayload, NotificationEvent};
pub use ids::LogEntryId;
pub use message::{BusMessage, Topic, UnknownTopic};
pub use render::{BadgeDisplay, RenderCommand};
