//! One game session: the bus and everything hanging off it.
//!
//! [`Session`] owns the wiring for the lifetime of a game. It restores the
//! event log from the save store on startup, feeds player input onto the
//! bus, drives the pipeline's clock, and on shutdown flushes the slot and
//! saves the log again.
//!
//! [`drive`] is the async loop used by `main`: it multiplexes input lines
//! and a fixed-interval clock until the player quits or input ends and the
//! slot has emptied.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use lifesim_core::{NotificationPipeline, Phase, PresentationSink, SessionConfig};
use lifesim_events::EventBus;
use lifesim_log::{LogError, LogStore, LogViewer, SaveStore};
use lifesim_types::{BusMessage, GameEventPayload, Topic};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::terminal::TerminalSurface;

/// Most recent log entries printed when the log panel opens.
const LOG_PANEL_ROWS: usize = 20;

/// What a line of player input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Publish a game event.
    Event(GameEventPayload),
    /// Click the log icon.
    OpenLog,
    /// Close the log panel.
    CloseLog,
    /// End the session.
    Quit,
    /// Nothing to do.
    Skip,
}

/// Interpret one line of input.
///
/// `:log`, `:close` and `:quit` are commands. A line that parses as a JSON
/// string or `{text, category?}` record is used as-is; anything else is
/// the event text.
pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    match line {
        "" => Command::Skip,
        ":log" => Command::OpenLog,
        ":close" => Command::CloseLog,
        ":quit" => Command::Quit,
        _ if line.starts_with('{') || line.starts_with('"') => {
            serde_json::from_str::<GameEventPayload>(line).map_or_else(
                |e| {
                    debug!("input is not a JSON event ({e}), using it as text");
                    Command::Event(GameEventPayload::Text(line.to_owned()))
                },
                Command::Event,
            )
        }
        _ => Command::Event(GameEventPayload::Text(line.to_owned())),
    }
}

/// A wired-up game session rendering to `W`.
pub struct Session<W: Write + 'static> {
    bus: EventBus,
    pipeline: Rc<NotificationPipeline>,
    surface: Rc<RefCell<TerminalSurface<W>>>,
    log: Rc<LogStore>,
    viewer: Rc<LogViewer>,
    saves: Box<dyn SaveStore>,
    save_key: String,
}

impl<W: Write + 'static> Session<W> {
    /// Build a session, restoring any saved log from `saves`.
    ///
    /// A corrupt save is reported and the session starts with an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Log`] if the save store cannot be read.
    pub fn new(
        config: &SessionConfig,
        saves: Box<dyn SaveStore>,
        out: W,
    ) -> Result<Self, EngineError> {
        let bus = EventBus::new();

        let log = LogStore::new();
        match log.load(saves.as_ref(), &config.session.save_key) {
            Ok(restored) => debug!(restored, "event log ready"),
            Err(e @ LogError::Corrupt { .. }) => warn!("ignoring saved event log: {e}"),
            Err(e) => return Err(e.into()),
        }
        log.attach(&bus);

        let surface = Rc::new(RefCell::new(TerminalSurface::new(out)));
        let sink: Rc<RefCell<dyn PresentationSink>> = surface.clone();
        let pipeline =
            NotificationPipeline::new(config.notifications, bus.clone(), Rc::downgrade(&sink));
        pipeline.install();

        let viewer = LogViewer::new(bus.clone());
        viewer.attach();

        let panel_surface = Rc::downgrade(&surface);
        let panel_log = Rc::downgrade(&log);
        bus.subscribe(Topic::LogOpened, move |_| {
            if let (Some(surface), Some(log)) = (panel_surface.upgrade(), panel_log.upgrade()) {
                if let Ok(mut surface) = surface.try_borrow_mut() {
                    surface.print_log(&log.recent(LOG_PANEL_ROWS));
                }
            }
        });

        info!(
            restored = log.len(),
            save_key = %config.session.save_key,
            "session started"
        );

        Ok(Self {
            bus,
            pipeline,
            surface,
            log,
            viewer,
            saves,
            save_key: config.session.save_key.clone(),
        })
    }

    /// Apply one input command. Returns `false` when the session should end.
    pub fn handle(&self, command: Command) -> bool {
        match command {
            Command::Event(payload) => {
                self.bus.publish(&BusMessage::GameEvent(payload));
            }
            Command::OpenLog => self.pipeline.relay_log_icon_click(),
            Command::CloseLog => self.viewer.close(),
            Command::Quit => return false,
            Command::Skip => {}
        }
        true
    }

    /// Advance the pipeline clock to `elapsed` since the session started.
    pub fn tick(&self, elapsed: Duration) {
        let now = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.pipeline.advance_to(now);
    }

    /// Whether the display slot is empty.
    pub fn is_idle(&self) -> bool {
        self.pipeline.phase() == Phase::Idle
    }

    /// The session's pipeline.
    pub const fn pipeline(&self) -> &Rc<NotificationPipeline> {
        &self.pipeline
    }

    /// The session's event log.
    pub const fn log(&self) -> &Rc<LogStore> {
        &self.log
    }

    /// The session's log panel.
    #[cfg(test)]
    pub const fn viewer(&self) -> &Rc<LogViewer> {
        &self.viewer
    }

    /// The presentation surface.
    #[cfg(test)]
    pub const fn surface(&self) -> &Rc<RefCell<TerminalSurface<W>>> {
        &self.surface
    }

    /// Tear down the pipeline, logging whatever is still shown, and save
    /// the log. Returns the save store.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Log`] if the log cannot be saved.
    pub fn shutdown(mut self) -> Result<Box<dyn SaveStore>, EngineError> {
        self.pipeline.teardown();
        self.log.persist(self.saves.as_mut(), &self.save_key)?;
        info!(entries = self.log.len(), "session ended");
        Ok(self.saves)
    }
}

/// Run `session` against `input` until `:quit`, or until input ends and
/// the slot is empty. The pipeline clock is polled every `interval`.
///
/// # Errors
///
/// Returns [`EngineError::Io`] if reading input fails.
pub async fn drive<W, R>(
    session: &Session<W>,
    input: R,
    interval: Duration,
) -> Result<(), EngineError>
where
    W: Write + 'static,
    R: AsyncBufRead + Unpin,
{
    let start = Instant::now();
    let mut clock = tokio::time::interval(interval);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = input.lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        // Dwell is measured from arrival, not from the last tick.
                        session.tick(start.elapsed());
                        if !session.handle(parse_line(&line)) {
                            info!("quit requested");
                            return Ok(());
                        }
                    }
                    None => {
                        debug!("input closed, waiting for the slot to empty");
                        input_open = false;
                    }
                }
            }
            _ = clock.tick() => {
                session.tick(start.elapsed());
                if !input_open && session.is_idle() {
                    return Ok(());
                }
            }
        }
    }
}
