//! Synthetic load generator for stress testing a throttler.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::info;

use crate::event::{unix_time_ms, Event};
use crate::ratelimit::Throttle;

/// Fires mock events at a fixed rate against a throttler and logs each
/// verdict.
pub struct Hammer<T: Throttle> {
    throttler: Arc<T>,
    hammer_rate: u32,
    key_space: u64,
}

impl<T: Throttle + 'static> Hammer<T> {
    /// `hammer_rate` is events per second. A `key_space` of 1 pins every
    /// event to key 0; larger values spread events over random keys below
    /// it.
    pub fn new(throttler: Arc<T>, hammer_rate: u32, key_space: u64) -> Self {
        Self {
            throttler,
            hammer_rate,
            key_space,
        }
    }

    /// Run until cancelled. A rate of zero means there is nothing to do and
    /// the call returns immediately.
    pub async fn run(&self) {
        if self.hammer_rate == 0 {
            return;
        }

        let delay = Duration::from_millis(u64::from(1000 / self.hammer_rate).max(1));

        // Fire at the top of the second so that concurrent hits across
        // nodes line up.
        let offset = 1000 - unix_time_ms().rem_euclid(1000);
        tokio::time::sleep(Duration::from_millis(offset as u64)).await;

        info!(
            rate = self.hammer_rate,
            keys = self.key_space,
            "hammer started"
        );

        let mut ticks = IntervalStream::new(tokio::time::interval(delay));
        while ticks.next().await.is_some() {
            let throttler = Arc::clone(&self.throttler);
            let key = self.next_key();

            // Each hit runs on its own task so a grace wait never delays
            // the tick schedule.
            tokio::spawn(async move {
                let event = Event::now(key);
                if throttler.can_proceed(event).await {
                    info!(key, second = event.event_time / 1000, "proceed");
                } else {
                    info!(key, second = event.event_time / 1000, "rejected");
                }
            });
        }
    }

    fn next_key(&self) -> i64 {
        if self.key_space <= 1 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.key_space) as i64
        }
    }
}
