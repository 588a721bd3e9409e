//! Notification staging for a Lifesim game session.
//!
//! This crate owns the single "now showing" slot of the HUD: it takes game
//! events off the bus, shows one at a time for a guaranteed dwell time,
//! demotes them into the durable log, and keeps the unread counter.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `lifesim-config.yaml` into
//!   strongly-typed structs.
//! - [`timer`] -- Cancellable one-shot timers on a virtual clock.
//! - [`presentation`] -- [`PresentationSink`] trait and [`RecordingSink`].
//! - [`pipeline`] -- The [`NotificationPipeline`] state machine.
//!
//! [`PresentationSink`]: presentation::PresentationSink
//! [`RecordingSink`]: presentation::RecordingSink
//! [`NotificationPipeline`]: pipeline::NotificationPipeline

pub mod config;
pub mod pipeline;
pub mod presentation;
pub mod timer;

pub use config::{ConfigError, NotificationConfig, SessionConfig};
pub use pipeline::{NotificationPipeline, Phase, badge_text};
pub use presentation::{PresentationSink, RecordingSink};
pub use timer::{TimerHandle, TimerKind, TimerQueue};
