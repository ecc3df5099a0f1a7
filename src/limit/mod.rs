//! Rate limiting
//!
//! Two cooperating tiers: a per-process token bucket keyed by caller identity
//! and a cluster-wide fixed-window counter backed by a shared atomic store.

mod clock;
mod global;
mod local;
mod store;

pub use clock::{Clock, SystemClock};
pub use global::{GlobalRateLimiter, GlobalVerdict};
pub use local::LocalRateLimiter;
pub use store::{CounterStore, MemoryCounterStore, RedisCounterStore};

#[cfg(test)]
pub(crate) use clock::ManualClock;
