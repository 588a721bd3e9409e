//! The notification staging pipeline.
//!
//! Game events arrive on the `gameEvent` topic and are shown one at a time
//! in a single display slot. Each event lives through
//!
//! ```text
//! Idle -> Displayed --(dwell elapses)--> Departing --(settle elapses)--> Logged
//!            |                               |
//!            +---------(new event)-----------+-----------> Logged
//! ```
//!
//! and is handed to the durable log on `addToLog` exactly once. A new event
//! always preempts the current one, whether it is still displayed or already
//! departing; the preempted event is logged immediately, before the new one
//! is shown.
//!
//! # Execution model
//!
//! Everything runs on one thread and every operation runs to completion.
//! Publishing `addToLog` can make another subscriber publish `gameEvent`
//! straight back at the pipeline; such re-entrant calls are queued and
//! processed after the current operation finishes, never interleaved with
//! it. Time only moves through [`NotificationPipeline::advance_to`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use lifesim_events::{EventBus, Subscription};
use lifesim_types::{BadgeDisplay, BusMessage, NotificationEvent, RenderCommand, Topic};
use tracing::{debug, info, trace, warn};

use crate::config::NotificationConfig;
use crate::presentation::PresentationSink;
use crate::timer::{Expired, TimerHandle, TimerKind, TimerQueue};

/// Where the display slot is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing shown.
    Idle,
    /// An event is shown and its dwell timer is running.
    Displayed,
    /// The departure animation is running; the event is not logged yet.
    Departing,
}

/// The display slot. Holding the timer inside the variant keeps "a timer is
/// armed iff an event is active" true by construction.
#[derive(Debug)]
enum Slot {
    Idle,
    Displayed {
        event: NotificationEvent,
        timer: TimerHandle,
    },
    Departing {
        event: NotificationEvent,
        timer: TimerHandle,
    },
}

impl Slot {
    const fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Displayed { .. } => Phase::Displayed,
            Self::Departing { .. } => Phase::Departing,
        }
    }

    const fn event(&self) -> Option<&NotificationEvent> {
        match self {
            Self::Idle => None,
            Self::Displayed { event, .. } | Self::Departing { event, .. } => Some(event),
        }
    }
}

#[derive(Debug)]
enum Input {
    Ingest(NotificationEvent),
    Advance(u64),
    LogOpened,
    IconClicked,
    Flush,
}

#[derive(Debug)]
enum Effect {
    Publish(BusMessage),
    Render(RenderCommand),
}

#[derive(Debug)]
struct PipelineState {
    slot: Slot,
    unread: u64,
    badge: BadgeDisplay,
    timers: TimerQueue,
}

/// Format an unread count for the badge: the number itself up to `cap`,
/// `"{cap}+"` above it.
pub fn badge_text(count: u64, cap: u64) -> String {
    if count > cap {
        format!("{cap}+")
    } else {
        count.to_string()
    }
}

/// Owner of the display slot, the dwell/settle timers and the unread counter.
pub struct NotificationPipeline {
    config: NotificationConfig,
    bus: EventBus,
    surface: Weak<RefCell<dyn PresentationSink>>,
    state: RefCell<PipelineState>,
    inbox: RefCell<VecDeque<Input>>,
    running: Cell<bool>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl core::fmt::Debug for NotificationPipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationPipeline")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl NotificationPipeline {
    /// Create a pipeline that publishes on `bus` and renders to `surface`.
    ///
    /// The pipeline does not listen to the bus until [`install`](Self::install)
    /// is called.
    pub fn new(
        config: NotificationConfig,
        bus: EventBus,
        surface: Weak<RefCell<dyn PresentationSink>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            config,
            bus,
            surface,
            state: RefCell::new(PipelineState {
                slot: Slot::Idle,
                unread: 0,
                badge: BadgeDisplay::Hidden,
                timers: TimerQueue::new(),
            }),
            inbox: RefCell::new(VecDeque::new()),
            running: Cell::new(false),
            subscriptions: RefCell::new(Vec::new()),
        })
    }

    /// Subscribe to `gameEvent` and `logOpened`. Calling it twice does not
    /// double-subscribe.
    pub fn install(self: &Rc<Self>) {
        if !self.subscriptions.borrow().is_empty() {
            return;
        }

        let weak = Rc::downgrade(self);
        let on_event = self.bus.subscribe(Topic::GameEvent, move |msg| {
            if let (Some(pipeline), BusMessage::GameEvent(payload)) = (weak.upgrade(), msg) {
                pipeline.ingest(payload.clone().into_event());
            }
        });

        let weak = Rc::downgrade(self);
        let on_opened = self.bus.subscribe(Topic::LogOpened, move |_| {
            if let Some(pipeline) = weak.upgrade() {
                pipeline.on_log_opened();
            }
        });

        self.subscriptions
            .borrow_mut()
            .extend([on_event, on_opened]);
        info!(
            dwell_ms = self.config.dwell_ms,
            settle_ms = self.config.settle_ms,
            "notification pipeline installed"
        );
    }

    /// Unsubscribe from the bus, cancel timers and hand any event still in
    /// the slot to the log.
    pub fn teardown(&self) {
        for subscription in self.subscriptions.borrow_mut().drain(..) {
            self.bus.unsubscribe(subscription);
        }
        self.submit(Input::Flush);
        info!("notification pipeline torn down");
    }

    /// Show `event` now, preempting whatever is in the slot.
    pub fn ingest(&self, event: NotificationEvent) {
        self.submit(Input::Ingest(event));
    }

    /// Move virtual time to `now`, firing every timer due on the way.
    pub fn advance_to(&self, now: u64) {
        self.submit(Input::Advance(now));
    }

    /// The user opened the log: reset the unread counter and hide the badge.
    pub fn on_log_opened(&self) {
        self.submit(Input::LogOpened);
    }

    /// Forward a log-icon click from the presentation surface as
    /// `logIconClicked`.
    pub fn relay_log_icon_click(&self) {
        self.submit(Input::IconClicked);
    }

    /// Events ingested since the log was last opened.
    pub fn unread_count(&self) -> u64 {
        self.state.borrow().unread
    }

    /// Unread count as the badge shows it, e.g. `"7"` or `"99+"`.
    pub fn unread_display(&self) -> String {
        badge_text(self.unread_count(), self.config.badge_cap)
    }

    /// The event occupying the slot, including one that is departing.
    pub fn active_event(&self) -> Option<NotificationEvent> {
        self.state.borrow().slot.event().cloned()
    }

    /// Current lifecycle phase of the slot.
    pub fn phase(&self) -> Phase {
        self.state.borrow().slot.phase()
    }

    /// Current virtual time.
    pub fn now(&self) -> u64 {
        self.state.borrow().timers.now()
    }

    /// When the next timer fires, if one is armed.
    pub fn next_deadline(&self) -> Option<u64> {
        self.state.borrow().timers.next_deadline()
    }

    /// Number of armed timers (0 or 1 outside of an operation).
    pub fn armed_timers(&self) -> usize {
        self.state.borrow().timers.pending()
    }

    /// Queue `input` and, unless an operation is already running further up
    /// the stack, process the queue to exhaustion.
    fn submit(&self, input: Input) {
        self.inbox.borrow_mut().push_back(input);
        if self.running.replace(true) {
            trace!("pipeline busy, input queued");
            return;
        }
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(input) = next else { break };
            self.process(input);
        }
        self.running.set(false);
    }

    fn process(&self, input: Input) {
        let mut effects = Vec::new();
        let mut resume = None;
        {
            let mut state = self.state.borrow_mut();
            match input {
                Input::Ingest(event) => self.apply_ingest(&mut state, event, &mut effects),
                Input::Advance(until) => match state.timers.pop_due(until) {
                    Some(expired) => {
                        Self::apply_expiry(&mut state, self.config, expired, &mut effects);
                        resume = Some(until);
                    }
                    None => state.timers.advance_clock(until),
                },
                Input::LogOpened => Self::apply_log_opened(&mut state, &mut effects),
                Input::IconClicked => effects.push(Effect::Publish(BusMessage::LogIconClicked)),
                Input::Flush => Self::apply_flush(&mut state, &mut effects),
            }
        }

        for effect in effects {
            match effect {
                Effect::Publish(message) => {
                    self.bus.publish(&message);
                }
                Effect::Render(command) => self.render(command),
            }
        }

        // One expiry per step, so anything queued by this expiry's effects
        // runs before the next timer is considered.
        if let Some(until) = resume {
            self.inbox.borrow_mut().push_back(Input::Advance(until));
        }
    }

    fn apply_ingest(
        &self,
        state: &mut PipelineState,
        event: NotificationEvent,
        effects: &mut Vec<Effect>,
    ) {
        let previous = core::mem::replace(&mut state.slot, Slot::Idle);
        match previous {
            Slot::Idle => {}
            Slot::Displayed {
                event: displaced,
                timer,
            }
            | Slot::Departing {
                event: displaced,
                timer,
            } => {
                state.timers.cancel(timer);
                debug!(text = %displaced.text, "preempted, logging immediately");
                effects.push(Effect::Publish(BusMessage::AddToLog(displaced)));
            }
        }

        state.unread = state.unread.saturating_add(1);
        debug!(text = %event.text, unread = state.unread, "event ingested");

        let timer = state.timers.arm(self.config.dwell_ms, TimerKind::Dwell);
        effects.push(Effect::Render(RenderCommand::Show(event.clone())));
        state.slot = Slot::Displayed { event, timer };

        let badge = BadgeDisplay::Count(badge_text(state.unread, self.config.badge_cap));
        Self::set_badge(state, badge, effects);
    }

    fn apply_expiry(
        state: &mut PipelineState,
        config: NotificationConfig,
        expired: Expired,
        effects: &mut Vec<Effect>,
    ) {
        let slot = core::mem::replace(&mut state.slot, Slot::Idle);
        state.slot = match (slot, expired.kind) {
            (Slot::Displayed { event, timer }, TimerKind::Dwell) if timer == expired.handle => {
                debug!(text = %event.text, at = expired.deadline, "dwell elapsed, departing");
                effects.push(Effect::Render(RenderCommand::BeginDeparture));
                let timer = state.timers.arm(config.settle_ms, TimerKind::Settle);
                Slot::Departing { event, timer }
            }
            (Slot::Departing { event, timer }, TimerKind::Settle) if timer == expired.handle => {
                debug!(text = %event.text, at = expired.deadline, "departure settled, logging");
                effects.push(Effect::Publish(BusMessage::AddToLog(event)));
                effects.push(Effect::Render(RenderCommand::ClearSlot));
                Slot::Idle
            }
            (slot, kind) => {
                trace!(?kind, phase = ?slot.phase(), "stale timer ignored");
                slot
            }
        };
    }

    fn apply_log_opened(state: &mut PipelineState, effects: &mut Vec<Effect>) {
        state.unread = 0;
        debug!("log opened, unread reset");
        Self::set_badge(state, BadgeDisplay::Hidden, effects);
    }

    fn apply_flush(state: &mut PipelineState, effects: &mut Vec<Effect>) {
        state.timers.clear();
        if let Some(event) = core::mem::replace(&mut state.slot, Slot::Idle).event().cloned() {
            debug!(text = %event.text, "flushing active event to log");
            effects.push(Effect::Publish(BusMessage::AddToLog(event)));
            effects.push(Effect::Render(RenderCommand::ClearSlot));
        }
    }

    fn set_badge(state: &mut PipelineState, badge: BadgeDisplay, effects: &mut Vec<Effect>) {
        if state.badge != badge {
            state.badge = badge.clone();
            effects.push(Effect::Render(RenderCommand::SetBadge(badge)));
        }
    }

    fn render(&self, command: RenderCommand) {
        let Some(surface) = self.surface.upgrade() else {
            trace!(?command, "presentation surface gone, command dropped");
            return;
        };
        match surface.try_borrow_mut() {
            Ok(mut sink) => sink.render(command),
            Err(_) => warn!(?command, "presentation surface busy, command dropped"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::presentation::RecordingSink;

    fn setup() -> (Rc<NotificationPipeline>, Rc<RefCell<RecordingSink>>, EventBus) {
        let bus = EventBus::new();
        let sink = Rc::new(RefCell::new(RecordingSink::new()));
        let surface: Rc<RefCell<dyn PresentationSink>> = sink.clone();
        let pipeline =
            NotificationPipeline::new(NotificationConfig::default(), bus.clone(), Rc::downgrade(&surface));
        pipeline.install();
        (pipeline, sink, bus)
    }

    #[test]
    fn badge_text_saturates_above_cap() {
        assert_eq!(badge_text(0, 99), "0");
        assert_eq!(badge_text(99, 99), "99");
        assert_eq!(badge_text(100, 99), "99+");
        assert_eq!(badge_text(u64::MAX, 99), "99+");
    }

    #[test]
    fn ingest_shows_event_and_arms_dwell() {
        let (pipeline, sink, _bus) = setup();
        pipeline.ingest(NotificationEvent::with_category("Paid rent", "money"));

        assert_eq!(pipeline.phase(), Phase::Displayed);
        assert_eq!(pipeline.armed_timers(), 1);
        assert_eq!(pipeline.next_deadline(), Some(2000));
        assert_eq!(
            sink.borrow().commands(),
            &[
                RenderCommand::Show(NotificationEvent::with_category("Paid rent", "money")),
                RenderCommand::SetBadge(BadgeDisplay::Count("1".to_owned())),
            ]
        );
    }

    #[test]
    fn timer_is_armed_iff_slot_is_occupied() {
        let (pipeline, _sink, _bus) = setup();
        assert_eq!(pipeline.armed_timers(), 0);

        pipeline.ingest(NotificationEvent::new("A"));
        assert_eq!(pipeline.armed_timers(), 1);
        pipeline.advance_to(2000);
        assert_eq!(pipeline.phase(), Phase::Departing);
        assert_eq!(pipeline.armed_timers(), 1);
        pipeline.ingest(NotificationEvent::new("B"));
        assert_eq!(pipeline.armed_timers(), 1);
        pipeline.advance_to(10_000);
        assert_eq!(pipeline.phase(), Phase::Idle);
        assert_eq!(pipeline.armed_timers(), 0);
    }

    #[test]
    fn dropped_surface_does_not_stop_the_pipeline() {
        let bus = EventBus::new();
        let surface: Rc<RefCell<dyn PresentationSink>> = Rc::new(RefCell::new(RecordingSink::new()));
        let pipeline =
            NotificationPipeline::new(NotificationConfig::default(), bus, Rc::downgrade(&surface));
        drop(surface);

        pipeline.ingest(NotificationEvent::new("A"));
        pipeline.advance_to(2500);
        assert_eq!(pipeline.phase(), Phase::Idle);
        assert_eq!(pipeline.unread_count(), 1);
    }

    #[test]
    fn install_is_idempotent_and_teardown_unsubscribes() {
        let (pipeline, _sink, bus) = setup();
        pipeline.install();
        assert_eq!(bus.subscriber_count(Topic::GameEvent), 1);
        assert_eq!(bus.subscriber_count(Topic::LogOpened), 1);

        pipeline.teardown();
        assert_eq!(bus.subscriber_count(Topic::GameEvent), 0);
        assert_eq!(bus.subscriber_count(Topic::LogOpened), 0);
    }

    #[test]
    fn teardown_flushes_active_event_to_log() {
        let (pipeline, sink, bus) = setup();
        let logged = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&logged);
        bus.subscribe(Topic::AddToLog, move |msg| log.borrow_mut().push(msg.clone()));

        pipeline.ingest(NotificationEvent::new("A"));
        pipeline.teardown();

        assert_eq!(
            *logged.borrow(),
            vec![BusMessage::AddToLog(NotificationEvent::new("A"))]
        );
        assert_eq!(pipeline.phase(), Phase::Idle);
        assert_eq!(pipeline.armed_timers(), 0);
        assert_eq!(sink.borrow().commands().last(), Some(&RenderCommand::ClearSlot));
    }

    #[test]
    fn teardown_while_departing_logs_once() {
        let (pipeline, sink, bus) = setup();
        let logged = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&logged);
        bus.subscribe(Topic::AddToLog, move |msg| log.borrow_mut().push(msg.clone()));

        pipeline.ingest(NotificationEvent::new("A"));
        pipeline.advance_to(2100);
        assert_eq!(pipeline.phase(), Phase::Departing);
        assert_eq!(pipeline.next_deadline(), Some(2500));

        pipeline.teardown();
        assert_eq!(pipeline.armed_timers(), 0);
        assert_eq!(pipeline.next_deadline(), None);

        pipeline.advance_to(10_000);
        assert_eq!(
            *logged.borrow(),
            vec![BusMessage::AddToLog(NotificationEvent::new("A"))]
        );
        assert_eq!(pipeline.phase(), Phase::Idle);
        assert_eq!(sink.borrow().commands().last(), Some(&RenderCommand::ClearSlot));
    }

    #[test]
    fn icon_click_is_relayed_on_the_bus() {
        let (pipeline, _sink, bus) = setup();
        let clicks = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&clicks);
        bus.subscribe(Topic::LogIconClicked, move |_| counter.set(counter.get().saturating_add(1)));

        pipeline.relay_log_icon_click();
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn saturated_badge_is_not_re_rendered() {
        let (pipeline, sink, _bus) = setup();
        for i in 0..101 {
            pipeline.ingest(NotificationEvent::new(format!("e{i}")));
        }
        sink.borrow_mut().take_commands();

        pipeline.ingest(NotificationEvent::new("one more"));
        assert_eq!(pipeline.unread_display(), "99+");
        let commands = sink.borrow_mut().take_commands();
        assert!(
            !commands
                .iter()
                .any(|c| matches!(c, RenderCommand::SetBadge(_)))
        );
    }
}
