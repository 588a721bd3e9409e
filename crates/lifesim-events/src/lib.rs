//! Event bus for the Lifesim game session.
//!
//! A publish/subscribe channel keyed by [`Topic`]. Delivery is synchronous:
//! [`EventBus::publish`] returns only after every current subscriber of the
//! message's topic has run, in subscription order. A handler may publish
//! again from inside its callback; the nested message is delivered
//! depth-first before the outer delivery continues.
//!
//! The bus lives on a single thread for the lifetime of a session. It is a
//! cheap [`Rc`] handle so every component can be given its own clone at
//! construction instead of reaching for a global.
//!
//! Handlers are `Fn`, not `FnMut`. A component that needs mutable state
//! keeps it behind its own interior mutability, which also lets it decide
//! how to handle being re-entered by a nested publish.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lifesim_types::{BusMessage, Topic};
use tracing::debug;

/// A subscriber callback.
type Handler = Rc<dyn Fn(&BusMessage)>;

/// One registered subscriber.
struct Subscriber {
    id: u64,
    topic: Topic,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber>>,
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    topic: Topic,
}

impl Subscription {
    /// The topic this subscription listens on.
    pub const fn topic(&self) -> Topic {
        self.topic
    }
}

/// Single-threaded synchronous publish/subscribe bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<Inner>,
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl EventBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every message published on `topic`.
    ///
    /// Handlers registered while a message is being delivered do not
    /// receive that message.
    pub fn subscribe(&self, topic: Topic, handler: impl Fn(&BusMessage) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.saturating_add(1));
        self.inner.subscribers.borrow_mut().push(Subscriber {
            id,
            topic,
            handler: Rc::new(handler),
        });
        debug!(topic = %topic, subscription = id, "subscribed");
        Subscription { id, topic }
    }

    /// Remove a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != subscription.id);
        let removed = subscribers.len() < before;
        if removed {
            debug!(topic = %subscription.topic, subscription = subscription.id, "unsubscribed");
        }
        removed
    }

    /// Deliver `message` to every subscriber of its topic.
    ///
    /// Returns the number of handlers invoked; zero subscribers is not an
    /// error. A subscriber removed by an earlier handler during the same
    /// delivery is skipped.
    pub fn publish(&self, message: &BusMessage) -> usize {
        let topic = message.topic();
        let targets: Vec<(u64, Handler)> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| (s.id, Rc::clone(&s.handler)))
            .collect();

        debug!(topic = %topic, subscribers = targets.len(), "publish");

        let mut delivered: usize = 0;
        for (id, handler) in targets {
            if !self.is_subscribed(id) {
                continue;
            }
            handler(message);
            delivered = delivered.saturating_add(1);
        }
        delivered
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.topic == topic)
            .count()
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.inner.subscribers.borrow().iter().any(|s| s.id == id)
    }
}
