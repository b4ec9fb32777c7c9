//! Stream utilities for snapshot subscriptions

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
