//! Rate limiting logic and state management.

mod backend;
mod counter;
mod local;
mod registry;
mod throttler;

pub use backend::Throttle;
pub use counter::{EventCounter, WINDOW_MS};
pub use local::LocalThrottler;
pub use registry::CounterRegistry;
pub use throttler::GlobalThrottler;
