//! End-to-end timing scenarios for the notification pipeline.
//!
//! Each test wires a real [`EventBus`], a pipeline and a timeline sink that
//! writes render commands and `addToLog` deliveries into one shared
//! timeline, so ordering between the two streams can be asserted.

#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;

use lifesim_core::{NotificationConfig, NotificationPipeline, Phase, PresentationSink};
use lifesim_events::EventBus;
use lifesim_types::{BadgeDisplay, BusMessage, NotificationEvent, RenderCommand, Topic};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Render(RenderCommand),
    Logged(NotificationEvent),
}

type Timeline = Rc<RefCell<Vec<Step>>>;

struct TimelineSink(Timeline);

impl PresentationSink for TimelineSink {
    fn render(&mut self, command: RenderCommand) {
        self.0.borrow_mut().push(Step::Render(command));
    }
}

struct Harness {
    bus: EventBus,
    pipeline: Rc<NotificationPipeline>,
    timeline: Timeline,
    _surface: Rc<RefCell<dyn PresentationSink>>,
}

impl Harness {
    fn new() -> Self {
        let bus = EventBus::new();
        let timeline: Timeline = Rc::new(RefCell::new(Vec::new()));
        let surface: Rc<RefCell<dyn PresentationSink>> =
            Rc::new(RefCell::new(TimelineSink(Rc::clone(&timeline))));
        let pipeline = NotificationPipeline::new(
            NotificationConfig::default(),
            bus.clone(),
            Rc::downgrade(&surface),
        );
        pipeline.install();

        let log_timeline = Rc::clone(&timeline);
        bus.subscribe(Topic::AddToLog, move |msg| {
            if let BusMessage::AddToLog(event) = msg {
                log_timeline.borrow_mut().push(Step::Logged(event.clone()));
            }
        });

        Self {
            bus,
            pipeline,
            timeline,
            _surface: surface,
        }
    }

    fn publish(&self, text: &str) {
        self.bus.publish(&BusMessage::game_event(NotificationEvent::new(text)));
    }

    fn logged(&self) -> Vec<String> {
        self.timeline
            .borrow()
            .iter()
            .filter_map(|step| match step {
                Step::Logged(event) => Some(event.text.clone()),
                Step::Render(_) => None,
            })
            .collect()
    }

    fn take(&self) -> Vec<Step> {
        core::mem::take(&mut *self.timeline.borrow_mut())
    }
}

fn show(text: &str) -> Step {
    Step::Render(RenderCommand::Show(NotificationEvent::new(text)))
}

fn logged(text: &str) -> Step {
    Step::Logged(NotificationEvent::new(text))
}

fn badge(text: &str) -> Step {
    Step::Render(RenderCommand::SetBadge(BadgeDisplay::Count(text.to_owned())))
}

#[test]
fn at_most_one_event_is_active_after_every_call() {
    let h = Harness::new();
    let mut now = 0_u64;
    for (i, gap) in [0_u64, 100, 2000, 2100, 50, 3000, 10].into_iter().enumerate() {
        now = now.saturating_add(gap);
        h.pipeline.advance_to(now);
        h.publish(&format!("event-{i}"));
        assert_eq!(
            h.pipeline.active_event().map(|e| e.text),
            Some(format!("event-{i}"))
        );
        assert!(h.pipeline.armed_timers() <= 1);
    }
}

#[test]
fn displaced_event_is_logged_once_before_the_new_show() {
    let h = Harness::new();
    h.publish("A");
    h.take();

    h.pipeline.advance_to(100);
    h.publish("B");

    assert_eq!(h.take(), vec![logged("A"), show("B"), badge("2")]);
}

#[test]
fn dwell_then_settle_logs_exactly_once_and_clears_slot() {
    let h = Harness::new();
    h.publish("A");
    assert_eq!(h.take(), vec![show("A"), badge("1")]);

    h.pipeline.advance_to(1999);
    assert!(h.take().is_empty());

    h.pipeline.advance_to(2000);
    assert_eq!(h.take(), vec![Step::Render(RenderCommand::BeginDeparture)]);
    assert_eq!(h.pipeline.phase(), Phase::Departing);
    assert_eq!(h.pipeline.active_event(), Some(NotificationEvent::new("A")));

    h.pipeline.advance_to(2499);
    assert!(h.take().is_empty());

    h.pipeline.advance_to(2500);
    assert_eq!(
        h.take(),
        vec![logged("A"), Step::Render(RenderCommand::ClearSlot)]
    );
    assert_eq!(h.pipeline.phase(), Phase::Idle);
    assert_eq!(h.pipeline.active_event(), None);

    h.pipeline.advance_to(100_000);
    assert!(h.take().is_empty());
}

#[test]
fn one_large_advance_runs_the_whole_demotion() {
    let h = Harness::new();
    h.publish("A");
    h.take();

    h.pipeline.advance_to(60_000);
    assert_eq!(
        h.take(),
        vec![
            Step::Render(RenderCommand::BeginDeparture),
            logged("A"),
            Step::Render(RenderCommand::ClearSlot),
        ]
    );
    assert_eq!(h.pipeline.now(), 60_000);
}

#[test]
fn preemption_at_100_logs_a_and_shows_b() {
    let h = Harness::new();
    h.publish("A");
    h.pipeline.advance_to(100);
    h.publish("B");

    let steps = h.take();
    assert_eq!(steps.iter().filter(|s| **s == logged("A")).count(), 1);
    assert_eq!(h.pipeline.active_event(), Some(NotificationEvent::new("B")));
    assert_eq!(h.pipeline.unread_count(), 2);

    // B gets its full dwell from the moment it arrived.
    assert_eq!(h.pipeline.next_deadline(), Some(2100));
}

#[test]
fn preemption_mid_departure_logs_immediately() {
    let h = Harness::new();
    h.publish("A");
    h.pipeline.advance_to(2000);
    assert_eq!(h.pipeline.phase(), Phase::Departing);
    h.take();

    h.pipeline.advance_to(2100);
    h.publish("B");
    assert_eq!(h.take(), vec![logged("A"), show("B"), badge("2")]);
    assert_eq!(h.pipeline.phase(), Phase::Displayed);

    // The cancelled settle timer at 2500 must not log A a second time.
    h.pipeline.advance_to(2500);
    assert!(h.take().is_empty());
    assert_eq!(h.pipeline.active_event(), Some(NotificationEvent::new("B")));
}

#[test]
fn unread_counts_ingests_and_resets_on_log_opened() {
    let h = Harness::new();
    for i in 0..7 {
        h.publish(&format!("e{i}"));
    }
    assert_eq!(h.pipeline.unread_count(), 7);

    h.bus.publish(&BusMessage::LogOpened);
    assert_eq!(h.pipeline.unread_count(), 0);
    assert_eq!(h.pipeline.unread_display(), "0");
}

#[test]
fn unread_display_saturates_at_99_plus() {
    let h = Harness::new();
    for i in 1..=150_u32 {
        h.publish("tick");
        let expected = if i <= 99 { i.to_string() } else { "99+".to_owned() };
        assert_eq!(h.pipeline.unread_display(), expected);
    }
}

#[test]
fn log_opened_twice_hides_badge_once() {
    let h = Harness::new();
    h.publish("A");
    h.take();

    h.bus.publish(&BusMessage::LogOpened);
    h.bus.publish(&BusMessage::LogOpened);

    assert_eq!(
        h.take(),
        vec![Step::Render(RenderCommand::SetBadge(BadgeDisplay::Hidden))]
    );
    assert_eq!(h.pipeline.unread_count(), 0);
}

#[test]
fn bare_string_payload_is_ingested_without_category() {
    let h = Harness::new();
    h.bus.publish(&BusMessage::game_event("Got a raise"));
    assert_eq!(
        h.pipeline.active_event(),
        Some(NotificationEvent::new("Got a raise"))
    );
}

#[test]
fn re_entrant_game_event_runs_after_current_operation() {
    let h = Harness::new();

    // A log consumer that reacts to the first logged event by raising a new one.
    let echo_bus = h.bus.clone();
    h.bus.subscribe(Topic::AddToLog, move |msg| {
        if let BusMessage::AddToLog(event) = msg {
            if event.text == "A" {
                echo_bus.publish(&BusMessage::game_event("echo"));
            }
        }
    });

    h.publish("A");
    h.take();
    h.publish("B");

    assert_eq!(
        h.take(),
        vec![
            logged("A"),
            show("B"),
            badge("2"),
            logged("B"),
            show("echo"),
            badge("3"),
        ]
    );
    assert_eq!(h.pipeline.active_event(), Some(NotificationEvent::new("echo")));
    assert_eq!(h.pipeline.armed_timers(), 1);
}

#[test]
fn re_entrant_event_raised_at_settle_gets_a_fresh_dwell() {
    let h = Harness::new();
    let echo_bus = h.bus.clone();
    h.bus.subscribe(Topic::AddToLog, move |msg| {
        if matches!(msg, BusMessage::AddToLog(event) if event.text == "A") {
            echo_bus.publish(&BusMessage::game_event("follow-up"));
        }
    });

    h.publish("A");
    h.pipeline.advance_to(4499);

    // follow-up arrived when A settled at 2500, so it departs at 4500.
    assert_eq!(
        h.pipeline.active_event(),
        Some(NotificationEvent::new("follow-up"))
    );
    assert_eq!(h.pipeline.phase(), Phase::Displayed);
    assert_eq!(h.pipeline.next_deadline(), Some(4500));

    h.pipeline.advance_to(10_000);
    assert_eq!(h.pipeline.phase(), Phase::Idle);
    assert_eq!(h.logged(), vec!["A".to_owned(), "follow-up".to_owned()]);
}
