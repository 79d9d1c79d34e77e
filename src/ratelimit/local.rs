//! Single-node admission with no peer coordination.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::event::Event;

use super::backend::Throttle;
use super::registry::CounterRegistry;

/// Admits events against the local registry only.
///
/// No broadcast and no grace wait: the verdict is whatever the local
/// counter says at the moment of the call. Useful when a node runs without
/// peers and as a baseline in tests.
pub struct LocalThrottler {
    registry: Arc<CounterRegistry>,
}

impl LocalThrottler {
    /// Create a throttler with a fresh registry.
    pub fn new(max_rate: u32) -> Self {
        Self {
            registry: Arc::new(CounterRegistry::new(max_rate)),
        }
    }

    /// Create a throttler sharing an existing registry.
    pub fn with_registry(registry: Arc<CounterRegistry>) -> Self {
        Self { registry }
    }

    /// Decide whether `event` may proceed, consulting only local state.
    pub fn can_proceed(&self, event: Event) -> bool {
        let admitted = self.registry.counter(event.key).try_admit(event);
        trace!(key = event.key, admitted, "local admission");
        admitted
    }

    /// The registry backing this throttler.
    pub fn registry(&self) -> &Arc<CounterRegistry> {
        &self.registry
    }
}

#[async_trait]
impl Throttle for LocalThrottler {
    async fn can_proceed(&self, event: Event) -> bool {
        LocalThrottler::can_proceed(self, event)
    }
}
