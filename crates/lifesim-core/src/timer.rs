//! Cancellable one-shot timers on a virtual clock.
//!
//! [`TimerQueue`] owns the notion of "now" for the pipeline. Time is an
//! abstract `u64` of time units (milliseconds in the engine); it only moves
//! when the owner calls [`TimerQueue::pop_due`] or
//! [`TimerQueue::advance_clock`], which keeps every timing scenario
//! reproducible in tests.
//!
//! Expired timers are handed out one at a time, earliest deadline first,
//! ties broken by arming order. The clock is moved to each timer's deadline
//! as it is popped, so a timer armed while handling an expiry is scheduled
//! relative to that expiry and not to the end of the advance.

use std::collections::BTreeMap;

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// The shown event's minimum display time.
    Dwell,
    /// The departure animation window.
    Settle,
}

/// Handle returned by [`TimerQueue::arm`]. Unique for the queue's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

/// A timer that reached its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired {
    /// Handle the timer was armed with.
    pub handle: TimerHandle,
    /// Purpose of the timer.
    pub kind: TimerKind,
    /// Instant the timer fired at.
    pub deadline: u64,
}

/// Virtual-time scheduler of one-shot timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: u64,
    next_id: u64,
    pending: BTreeMap<(u64, TimerHandle), TimerKind>,
}

impl TimerQueue {
    /// Create an empty queue with the clock at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Arm a timer that fires `delay` units from now.
    pub fn arm(&mut self, delay: u64, kind: TimerKind) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let deadline = self.now.saturating_add(delay);
        self.pending.insert((deadline, handle), kind);
        handle
    }

    /// Cancel a timer. Cancelling a fired or already cancelled timer is a
    /// no-op and returns `false`.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let key = self.pending.keys().find(|(_, h)| *h == handle).copied();
        key.is_some_and(|key| self.pending.remove(&key).is_some())
    }

    /// Whether `handle` is still armed.
    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.pending.keys().any(|(_, h)| *h == handle)
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving the clock to its deadline.
    pub fn pop_due(&mut self, until: u64) -> Option<Expired> {
        let (&(deadline, handle), _) = self.pending.first_key_value()?;
        if deadline > until {
            return None;
        }
        let kind = self.pending.remove(&(deadline, handle))?;
        self.now = self.now.max(deadline);
        Some(Expired {
            handle,
            kind,
            deadline,
        })
    }

    /// Move the clock forward to `until`. Earlier instants are ignored.
    pub fn advance_clock(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    /// Deadline of the earliest armed timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Cancel every armed timer.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_at_deadline_not_before() {
        let mut timers = TimerQueue::new();
        let handle = timers.arm(2000, TimerKind::Dwell);

        assert_eq!(timers.pop_due(1999), None);
        let expired = timers.pop_due(2000).unwrap();
        assert_eq!(expired.handle, handle);
        assert_eq!(expired.kind, TimerKind::Dwell);
        assert_eq!(timers.now(), 2000);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut timers = TimerQueue::new();
        let handle = timers.arm(10, TimerKind::Settle);

        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle));
        assert_eq!(timers.pop_due(u64::MAX), None);
    }

    #[test]
    fn cancel_after_fire_is_a_no_op() {
        let mut timers = TimerQueue::new();
        let handle = timers.arm(10, TimerKind::Dwell);
        assert!(timers.pop_due(10).is_some());
        assert!(!timers.cancel(handle));
    }

    #[test]
    fn expiries_come_out_in_deadline_then_arming_order() {
        let mut timers = TimerQueue::new();
        let late = timers.arm(30, TimerKind::Dwell);
        let first = timers.arm(10, TimerKind::Dwell);
        let second = timers.arm(10, TimerKind::Settle);

        let order: Vec<TimerHandle> = core::iter::from_fn(|| timers.pop_due(100))
            .map(|e| e.handle)
            .collect();
        assert_eq!(order, vec![first, second, late]);
    }

    #[test]
    fn timer_armed_during_expiry_is_relative_to_that_expiry() {
        let mut timers = TimerQueue::new();
        timers.arm(2000, TimerKind::Dwell);

        let expired = timers.pop_due(5000).unwrap();
        assert_eq!(expired.deadline, 2000);
        timers.arm(500, TimerKind::Settle);

        assert_eq!(timers.next_deadline(), Some(2500));
        assert_eq!(timers.pop_due(5000).map(|e| e.kind), Some(TimerKind::Settle));
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut timers = TimerQueue::new();
        timers.advance_clock(100);
        timers.advance_clock(50);
        assert_eq!(timers.now(), 100);
    }

    #[test]
    fn handles_are_unique() {
        let mut timers = TimerQueue::new();
        let a = timers.arm(1, TimerKind::Dwell);
        timers.cancel(a);
        let b = timers.arm(1, TimerKind::Dwell);
        assert_ne!(a, b);
        assert!(timers.is_armed(b));
        assert!(!timers.is_armed(a));
    }
}
