//! Per-key sliding-window event counter.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::event::{unix_time_ms, Event};

/// Length of the rolling window over which events are counted.
pub const WINDOW_MS: i64 = 1000;

/// Counts events for a single key over a rolling one-second window.
///
/// Events are appended at the tail in arrival order and pruned from the
/// head as they age out, so decay is a single prefix scan. Every mutation
/// happens under one internal lock, which makes admit-check, force-record,
/// and decay linearizable per counter while leaving counters for different
/// keys free of contention with each other.
pub struct EventCounter {
    /// Retained events, oldest first.
    events: Mutex<VecDeque<Event>>,
    /// Maximum admissible events per window.
    max_rate: u32,
}

impl EventCounter {
    /// Create a counter admitting at most `max_rate` events per second.
    pub fn new(max_rate: u32) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            max_rate,
        }
    }

    /// Admit and count the event if the window still has room.
    ///
    /// Expired entries are decayed first. Returns `false` without recording
    /// anything when the counter is full. The check and the insert happen
    /// under a single lock acquisition, so concurrent admissions cannot
    /// push the locally admitted count past `max_rate`.
    pub fn try_admit(&self, event: Event) -> bool {
        let mut events = self.events.lock();
        Self::prune(&mut events, unix_time_ms() - WINDOW_MS);

        if events.len() < self.max_rate as usize {
            events.push_back(event);
            return true;
        }

        false
    }

    /// Count an event regardless of current occupancy.
    ///
    /// Peer-reported events go through this path: the peer already observed
    /// the event, so the local view must reflect it even when the window is
    /// full. Refusing it would understate true global load.
    pub fn force_record(&self, event: Event) {
        self.events.lock().push_back(event);
    }

    /// Drop every retained event with `event_time <= cutoff_ms`.
    pub fn decay(&self, cutoff_ms: i64) {
        Self::prune(&mut self.events.lock(), cutoff_ms);
    }

    /// Number of events attributed to this key within the trailing window.
    pub fn current_rate(&self) -> usize {
        let mut events = self.events.lock();
        Self::prune(&mut events, unix_time_ms() - WINDOW_MS);
        events.len()
    }

    /// The configured per-window limit.
    pub fn max_rate(&self) -> u32 {
        self.max_rate
    }

    // Insertion order is non-decreasing by event_time, so once the head is
    // young enough the rest of the queue is too.
    fn prune(events: &mut VecDeque<Event>, cutoff_ms: i64) {
        while events.front().map_or(false, |e| e.event_time <= cutoff_ms) {
            events.pop_front();
        }
    }
}
