//! `TimerQueue`: deadline-ordered queue of scheduled events.
//!
//! Cooldowns and deferred activations are one-shot timers.  Rather than
//! suspending anything, the owner pushes `(deadline, event)` here and the
//! single driver loop pops every due event at the start of a tick, so timer
//! callbacks never interleave with an agent's tick.
//!
//! `BTreeMap` gives O(log W) insert and pop where W = number of distinct
//! deadlines currently enqueued.  Events sharing a deadline fire in push
//! order.
//!
//! Cancellation is lazy: owners keep their own record of the live deadline
//! and discard popped events that no longer match it.

use std::collections::BTreeMap;

use crate::SimTime;

/// A priority queue mapping deadlines → events due at that instant.
pub struct TimerQueue<E> {
    inner: BTreeMap<SimTime, Vec<E>>,
    /// Cached total event count for O(1) `len()`.
    total: usize,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self { inner: BTreeMap::new(), total: 0 }
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to fire at `deadline`.
    pub fn push(&mut self, deadline: SimTime, event: E) {
        self.inner.entry(deadline).or_default().push(event);
        self.total += 1;
    }

    /// Remove and return every event due at or before `now`, earliest first.
    ///
    /// Returns an empty `Vec` without allocating when nothing is due.
    pub fn pop_due(&mut self, now: SimTime) -> Vec<(SimTime, E)> {
        let mut due = Vec::new();
        while let Some(entry) = self.inner.first_entry() {
            if *entry.key() > now {
                break;
            }
            let (deadline, events) = entry.remove_entry();
            self.total -= events.len();
            due.extend(events.into_iter().map(|e| (deadline, e)));
        }
        due
    }

    /// The earliest deadline with at least one queued event, or `None` if empty.
    pub fn next_deadline(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    /// Drop every queued event for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        self.inner.retain(|_, events| {
            events.retain(|e| keep(e));
            !events.is_empty()
        });
        self.total = self.inner.values().map(Vec::len).sum();
    }

    /// Total number of queued events across all deadlines.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
