//! Log panel controller.
//!
//! Reacts to `logIconClicked` by opening the panel and announcing it with
//! `logOpened`, which is what resets the pipeline's unread counter.

use std::cell::Cell;
use std::rc::Rc;

use lifesim_events::{EventBus, Subscription};
use lifesim_types::{BusMessage, Topic};
use tracing::debug;

/// Open/closed state of the log panel.
#[derive(Debug)]
pub struct LogViewer {
    bus: EventBus,
    open: Cell<bool>,
}

impl LogViewer {
    /// Create a closed viewer that announces on `bus`.
    pub fn new(bus: EventBus) -> Rc<Self> {
        Rc::new(Self {
            bus,
            open: Cell::new(false),
        })
    }

    /// Subscribe the viewer to `logIconClicked`.
    pub fn attach(self: &Rc<Self>) -> Subscription {
        let weak = Rc::downgrade(self);
        self.bus.subscribe(Topic::LogIconClicked, move |_| {
            if let Some(viewer) = weak.upgrade() {
                viewer.open();
            }
        })
    }

    /// Open the panel and publish `logOpened`. Opening an open panel
    /// announces again, so the counter is reset for events that arrived
    /// while it was open.
    pub fn open(&self) {
        self.open.set(true);
        debug!("log panel opened");
        self.bus.publish(&BusMessage::LogOpened);
    }

    /// Close the panel.
    pub fn close(&self) {
        if self.open.replace(false) {
            debug!("log panel closed");
        }
    }

    /// Whether the panel is open.
    pub fn is_open(&self) -> bool {
        self.open.get()
    }
}
