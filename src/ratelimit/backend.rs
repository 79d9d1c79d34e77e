//! Throttle trait for abstracting local and global admission.

use async_trait::async_trait;

use crate::event::Event;

/// Trait for admission decisions.
///
/// This trait abstracts over the single-node [`LocalThrottler`] and the
/// cluster-wide [`GlobalThrottler`] so that callers such as the load
/// generator can work with either.
///
/// [`LocalThrottler`]: super::LocalThrottler
/// [`GlobalThrottler`]: super::GlobalThrottler
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Decide whether `event` may proceed.
    ///
    /// May block the caller up to the backend's grace period.
    async fn can_proceed(&self, event: Event) -> bool;
}
