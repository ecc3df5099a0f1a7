//! Cluster-wide fixed-window limiter
//!
//! Counts admissions per identity per window in the shared counter store. The
//! post-increment value is the admission condition; the counter itself may
//! transiently exceed the limit under concurrent increments. Bursts spanning
//! a window boundary can momentarily pass up to twice the configured rate;
//! that overshoot is an accepted property of the fixed-window algorithm.

use super::clock::Clock;
use super::store::CounterStore;
use crate::config::{LimitConfig, OutagePolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a global limiter check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalVerdict {
    /// Within the window limit
    Admitted,
    /// Window limit exhausted (or store down under a fail-closed policy)
    LimitExceeded,
}

/// Fixed-window limiter over a shared atomic counter
pub struct GlobalRateLimiter {
    store: Arc<dyn CounterStore>,
    limit: i64,
    window: Duration,
    store_timeout: Duration,
    policy: OutagePolicy,
    clock: Arc<dyn Clock>,
}

impl GlobalRateLimiter {
    /// Create a limiter from the rate limit configuration
    pub fn new(config: &LimitConfig, store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            limit: config.global_limit,
            window: config.global_window(),
            store_timeout: config.store_timeout(),
            policy: config.on_store_unreachable,
            clock,
        }
    }

    /// Check the cluster-wide limit for the identity
    ///
    /// Increments the counter for the current window and admits when the
    /// post-increment value is within the limit. The store round trip is
    /// bounded by the configured timeout; a timeout or store error falls back
    /// to the configured outage policy and never propagates to the caller.
    pub async fn check(&self, identity: &str) -> GlobalVerdict {
        let window_id = self.clock.unix_secs() / self.window.as_secs();
        let key = format!("rate:{}:{}", identity, window_id);

        let increment = self.store.increment_with_ttl(&key, self.window);
        match tokio::time::timeout(self.store_timeout, increment).await {
            Ok(Ok(count)) => {
                if count > self.limit {
                    debug!(
                        "Global window exhausted for {} ({}/{})",
                        identity, count, self.limit
                    );
                    GlobalVerdict::LimitExceeded
                } else {
                    GlobalVerdict::Admitted
                }
            }
            Ok(Err(e)) => {
                warn!("Counter store error for {}: {}", identity, e);
                self.outage_verdict()
            }
            Err(_) => {
                warn!(
                    "Counter store timed out after {:?} for {}",
                    self.store_timeout, identity
                );
                self.outage_verdict()
            }
        }
    }

    fn outage_verdict(&self) -> GlobalVerdict {
        match self.policy {
            OutagePolicy::FailOpen => GlobalVerdict::Admitted,
            OutagePolicy::FailClosed => GlobalVerdict::LimitExceeded,
        }
    }
}
