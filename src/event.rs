//! Event values exchanged between throttling nodes.

use chrono::Utc;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn unix_time_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A single occurrence of a rate-limited action.
///
/// An event carries no identity beyond the key naming the contended
/// resource and the time at which it occurred; many events may share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Identifier of the rate-limited resource.
    pub key: i64,
    /// When the event occurred, in epoch milliseconds.
    pub event_time: i64,
}

impl Event {
    /// Create an event with an explicit timestamp.
    pub fn new(key: i64, event_time: i64) -> Self {
        Self { key, event_time }
    }

    /// An event for `key` stamped with the local wall clock.
    pub fn now(key: i64) -> Self {
        Self::new(key, unix_time_ms())
    }
}
