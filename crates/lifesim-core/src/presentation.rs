//! The seam between the pipeline and whatever draws notifications.
//!
//! The pipeline never owns its presentation surface. It holds a weak
//! reference and pushes [`RenderCommand`]s through [`PresentationSink`].
//! A surface that has been dropped simply stops receiving commands.

use lifesim_types::{BadgeDisplay, NotificationEvent, RenderCommand};

/// Receiver of one-way render commands.
pub trait PresentationSink {
    /// Apply a render command. Must not fail.
    fn render(&mut self, command: RenderCommand);
}

/// A sink that keeps every command it receives, plus the resulting view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    commands: Vec<RenderCommand>,
    showing: Option<NotificationEvent>,
    departing: bool,
    badge: Option<String>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command received so far, oldest first.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Drain the recorded commands, keeping the view state.
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        core::mem::take(&mut self.commands)
    }

    /// Event currently drawn in the slot, if any.
    pub const fn showing(&self) -> Option<&NotificationEvent> {
        self.showing.as_ref()
    }

    /// Whether the departure animation is running.
    pub const fn is_departing(&self) -> bool {
        self.departing
    }

    /// Badge text, or `None` when hidden.
    pub fn badge(&self) -> Option<&str> {
        self.badge.as_deref()
    }
}

impl PresentationSink for RecordingSink {
    fn render(&mut self, command: RenderCommand) {
        match &command {
            RenderCommand::Show(event) => {
                self.showing = Some(event.clone());
                self.departing = false;
            }
            RenderCommand::BeginDeparture => self.departing = true,
            RenderCommand::ClearSlot => {
                self.showing = None;
                self.departing = false;
            }
            RenderCommand::SetBadge(BadgeDisplay::Hidden) => self.badge = None,
            RenderCommand::SetBadge(BadgeDisplay::Count(text)) => self.badge = Some(text.clone()),
        }
        self.commands.push(command);
    }
}
