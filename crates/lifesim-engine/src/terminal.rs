//! A line-oriented presentation surface.
//!
//! Stands in for the browser HUD: every render command becomes one line of
//! text on the writer. The surface keeps no state beyond what the pipeline
//! pushes to it.

use std::io::Write;

use lifesim_core::PresentationSink;
use lifesim_log::LogEntry;
use lifesim_types::{BadgeDisplay, RenderCommand};
use tracing::warn;

/// Renders notifications as text lines.
#[derive(Debug)]
pub struct TerminalSurface<W: Write> {
    out: W,
}

impl<W: Write> TerminalSurface<W> {
    /// Render to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying writer.
    #[cfg(test)]
    pub const fn writer(&self) -> &W {
        &self.out
    }

    /// Print the log panel.
    pub fn print_log(&mut self, entries: &[LogEntry]) {
        self.line("== event log ==");
        if entries.is_empty() {
            self.line("   (empty)");
        }
        for entry in entries {
            let text = match &entry.event.category {
                Some(category) => format!(
                    "   {} [{category}] {}",
                    entry.logged_at.format("%H:%M:%S"),
                    entry.event.text
                ),
                None => format!("   {} {}", entry.logged_at.format("%H:%M:%S"), entry.event.text),
            };
            self.line(&text);
        }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            warn!("terminal write failed: {e}");
        }
    }
}

impl<W: Write> PresentationSink for TerminalSurface<W> {
    fn render(&mut self, command: RenderCommand) {
        let text = match command {
            RenderCommand::Show(event) => match event.category {
                Some(category) => format!(">> [{category}] {}", event.text),
                None => format!(">> {}", event.text),
            },
            RenderCommand::BeginDeparture => "<< ...".to_owned(),
            RenderCommand::ClearSlot => "<< (slot empty)".to_owned(),
            RenderCommand::SetBadge(BadgeDisplay::Count(count)) => format!("(log: {count} unread)"),
            RenderCommand::SetBadge(BadgeDisplay::Hidden) => "(log: all read)".to_owned(),
        };
        self.line(&text);
    }
}
