//! The throttling decision protocol.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, trace};

use crate::config::ThrottleConfig;
use crate::error::Result;
use crate::event::Event;
use crate::exchange::{EventExchange, PeerSet};

use super::backend::Throttle;
use super::registry::CounterRegistry;

/// Coordinates local admission with best-effort peer corroboration.
///
/// An event is first admitted against the local counter. If that succeeds,
/// the event is broadcast to all peers and the call waits out a fixed grace
/// period during which broadcasts for events admitted concurrently
/// elsewhere can arrive and be force-recorded. The final verdict re-reads
/// the counter: a rate at or under `max_rate` means proceed; anything above
/// means the cluster collectively overshot and this event must not proceed
/// even though it stays counted.
///
/// Correctness degrades gracefully as network delay exceeds the grace
/// period, at the cost of slight over-admission under concurrent load or
/// dropped broadcasts. There is no retry, leader, or quorum.
pub struct GlobalThrottler {
    registry: Arc<CounterRegistry>,
    exchange: Arc<EventExchange>,
    grace_period: Duration,
}

impl GlobalThrottler {
    /// Build a throttler from configuration: create the registry, load the
    /// peer set, bind the exchange socket, and start its listener.
    ///
    /// Startup resource failures (unreadable peer file, socket bind)
    /// propagate to the caller.
    pub async fn start(config: &ThrottleConfig) -> Result<Self> {
        let registry = Arc::new(CounterRegistry::new(config.limits.max_rate));
        let peers = PeerSet::from_file(&config.exchange.peers_path)?;
        let exchange = Arc::new(
            EventExchange::bind(&config.exchange, peers, Arc::clone(&registry)).await?,
        );
        exchange.start();

        info!(
            max_rate = config.limits.max_rate,
            grace_period_ms = config.limits.grace_period_ms,
            "global throttler started"
        );

        Ok(Self::with_parts(
            registry,
            exchange,
            config.limits.grace_period(),
        ))
    }

    /// Assemble a throttler from already constructed parts.
    ///
    /// The exchange must share the registry and have its listener running.
    pub fn with_parts(
        registry: Arc<CounterRegistry>,
        exchange: Arc<EventExchange>,
        grace_period: Duration,
    ) -> Self {
        Self {
            registry,
            exchange,
            grace_period,
        }
    }

    /// Decide whether `event` may proceed.
    ///
    /// Blocks the calling task for the grace period when the event passes
    /// the local check; the wait is per-request and never delays other
    /// admissions.
    pub async fn can_proceed(&self, event: Event) -> bool {
        let counter = self.registry.counter(event.key);

        // A full counter means this node alone has already seen the maximum
        // number of events over the last second. Bail out before touching
        // the network.
        if !counter.try_admit(event) {
            trace!(key = event.key, "rejected locally");
            return false;
        }

        // Report the event to the other throttling nodes.
        self.exchange.broadcast(event).await;

        // Let events admitted elsewhere make their way across time and
        // space.
        tokio::time::sleep(self.grace_period).await;

        // The event was counted by the admit step, so the rate now covers
        // it plus whatever the listener force-recorded meanwhile. Staying
        // at or under max_rate means no other node contended for the
        // window.
        let rate = counter.current_rate();
        let admitted = rate <= counter.max_rate() as usize;
        if !admitted {
            debug!(
                key = event.key,
                rate,
                max_rate = counter.max_rate(),
                "rejected after grace period"
            );
        }

        admitted
    }

    /// The registry shared with the exchange listener.
    pub fn registry(&self) -> &Arc<CounterRegistry> {
        &self.registry
    }

    /// The underlying event exchange.
    pub fn exchange(&self) -> &Arc<EventExchange> {
        &self.exchange
    }

    /// Stop the exchange listener.
    pub async fn shutdown(&self) {
        self.exchange.stop().await;
    }
}

#[async_trait]
impl Throttle for GlobalThrottler {
    async fn can_proceed(&self, event: Event) -> bool {
        GlobalThrottler::can_proceed(self, event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExchangeSettings;
    use std::time::Instant;

    async fn test_throttler(
        max_rate: u32,
        grace: Duration,
        peers: &str,
        port: u16,
    ) -> GlobalThrottler {
        let settings = ExchangeSettings {
            port,
            peers_path: String::new(),
            node_id: format!("test-node-{port}"),
        };
        let registry = Arc::new(CounterRegistry::new(max_rate));
        let exchange = Arc::new(
            EventExchange::bind(&settings, PeerSet::from_lines(peers), Arc::clone(&registry))
                .await
                .unwrap(),
        );
        exchange.start();
        GlobalThrottler::with_parts(registry, exchange, grace)
    }

    #[tokio::test]
    async fn test_admits_up_to_limit_then_fast_rejects() {
        let grace = Duration::from_millis(50);
        let throttler = test_throttler(2, grace, "", 0).await;

        assert!(throttler.can_proceed(Event::now(0)).await);
        assert!(throttler.can_proceed(Event::now(0)).await);

        // The third call fails the local check and must return without
        // incurring the grace wait.
        let start = Instant::now();
        assert!(!throttler.can_proceed(Event::now(0)).await);
        assert!(start.elapsed() < grace);

        throttler.shutdown().await;
    }

    #[tokio::test]
    async fn test_rejects_when_remote_event_arrives_mid_grace() {
        let throttler = test_throttler(1, Duration::from_millis(100), "", 0).await;
        let registry = Arc::clone(throttler.registry());

        // Simulate a peer broadcast landing while the caller waits.
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            registry.counter(7).force_record(Event::now(7));
        });

        // Locally admitted, then rejected at the re-check: the window now
        // holds two events against a limit of one.
        assert!(!throttler.can_proceed(Event::now(7)).await);
        assert_eq!(throttler.registry().counter(7).current_rate(), 2);

        throttler.shutdown().await;
    }

    #[tokio::test]
    async fn test_keys_are_throttled_independently() {
        let throttler = test_throttler(1, Duration::from_millis(20), "", 0).await;

        assert!(throttler.can_proceed(Event::now(1)).await);
        assert!(throttler.can_proceed(Event::now(2)).await);
        assert!(!throttler.can_proceed(Event::now(1)).await);

        throttler.shutdown().await;
    }

    // Two nodes each admit an event for the same key at the same moment,
    // broadcast, and receive each other's report during the grace wait.
    // Both re-checks then see a rate of 2 against a limit of 1, so both
    // nodes conservatively reject. On the current-thread test runtime both
    // local admissions happen before either listener task is polled, which
    // makes the interleaving deterministic.
    #[tokio::test]
    async fn test_two_nodes_mutually_over_reject() {
        let grace = Duration::from_millis(100);
        let node_a = test_throttler(1, grace, "127.0.0.1:18044", 18043).await;
        let node_b = test_throttler(1, grace, "127.0.0.1:18043", 18044).await;

        let (a, b) = tokio::join!(
            node_a.can_proceed(Event::now(7)),
            node_b.can_proceed(Event::now(7)),
        );

        assert!(!a, "node A should reject after seeing node B's event");
        assert!(!b, "node B should reject after seeing node A's event");
        assert_eq!(node_a.registry().counter(7).current_rate(), 2);
        assert_eq!(node_b.registry().counter(7).current_rate(), 2);

        node_a.shutdown().await;
        node_b.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_the_window() {
        let throttler = Arc::new(test_throttler(2, Duration::from_millis(30), "", 0).await);

        let calls = (0..4).map(|_| {
            let throttler = Arc::clone(&throttler);
            async move { throttler.can_proceed(Event::now(5)).await }
        });
        let verdicts = futures::future::join_all(calls).await;

        let admitted = verdicts.iter().filter(|v| **v).count();
        assert_eq!(admitted, 2, "exactly max_rate callers may proceed");

        throttler.shutdown().await;
    }

    #[tokio::test]
    async fn test_lone_node_with_peer_listed_still_admits() {
        // The peer is unreachable; its absence just means no corroborating
        // events arrive and the local verdict stands.
        let node = test_throttler(2, Duration::from_millis(50), "127.0.0.1:18055", 18054).await;

        assert!(node.can_proceed(Event::now(3)).await);

        node.shutdown().await;
    }
}
