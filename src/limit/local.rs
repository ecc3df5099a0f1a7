//! Per-process token bucket limiter
//!
//! One bucket per caller identity, refilled continuously at a fixed rate.
//! Buckets are created lazily at full capacity, so a new or long-idle caller
//! gets its full burst allowance.

use super::clock::Clock;
use crate::config::LimitConfig;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Per-identity bucket state
///
/// Invariant: `0 <= tokens <= capacity` after every check.
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket limiter keyed by caller identity
///
/// Mutation happens under the map's per-entry lock, so concurrent checks for
/// the same identity are serialized while distinct identities proceed in
/// parallel.
pub struct LocalRateLimiter {
    buckets: DashMap<String, Bucket>,
    rate: f64,
    capacity: f64,
    idle_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl LocalRateLimiter {
    /// Create a limiter from the rate limit configuration
    pub fn new(config: &LimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            rate: config.local_rate,
            capacity: f64::from(config.local_capacity),
            idle_timeout: config.idle_timeout(),
            clock,
        }
    }

    /// Try to consume one token for the identity
    ///
    /// Refills the bucket for the elapsed time since the last check, then
    /// consumes a token when at least one is available. Returns whether the
    /// request is admitted. Consumed tokens are never refunded.
    pub fn check(&self, identity: &str) -> bool {
        let now = self.clock.now();

        let mut entry = self
            .buckets
            .entry(identity.to_string())
            .or_insert_with(|| Bucket {
                tokens: self.capacity,
                last_refill: now,
            });

        let bucket = entry.value_mut();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            debug!("Local bucket exhausted for {}", identity);
            false
        }
    }

    /// Discard buckets idle longer than the configured threshold
    ///
    /// Safe to run at any time: a discarded bucket is recreated full on next
    /// use, which is the intended behavior for a long-idle caller.
    pub fn evict_idle(&self) {
        let now = self.clock.now();
        let idle_timeout = self.idle_timeout;
        let before = self.buckets.len();

        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.last_refill) < idle_timeout);

        // Other threads may insert while retain runs, so the difference can
        // come out negative.
        let evicted = before.saturating_sub(self.buckets.len());
        if evicted > 0 {
            debug!("Evicted {} idle local buckets", evicted);
        }
    }

    /// Number of identities currently tracked
    pub fn tracked_identities(&self) -> usize {
        self.buckets.len()
    }

    #[cfg(test)]
    fn tokens(&self, identity: &str) -> Option<f64> {
        self.buckets.get(identity).map(|b| b.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limit::ManualClock;

    fn limiter(rate: f64, capacity: u32, clock: Arc<ManualClock>) -> LocalRateLimiter {
        let config = LimitConfig {
            local_rate: rate,
            local_capacity: capacity,
            idle_timeout_secs: 300,
            ..LimitConfig::default()
        };
        LocalRateLimiter::new(&config, clock)
    }

    #[test]
    fn test_initial_burst_up_to_capacity() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(5.0, 5, clock);

        for _ in 0..5 {
            assert!(limiter.check("demo-client"));
        }
        assert!(!limiter.check("demo-client"));
    }

    #[test]
    fn test_refill_restores_admission_at_rate() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(5.0, 5, Arc::clone(&clock));

        for _ in 0..5 {
            assert!(limiter.check("demo-client"));
        }
        assert!(!limiter.check("demo-client"));

        // 200ms at 5 tokens/sec refills exactly one token.
        clock.advance(Duration::from_millis(200));
        assert!(limiter.check("demo-client"));
        assert!(!limiter.check("demo-client"));
    }

    #[test]
    fn test_tokens_never_exceed_capacity() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(10.0, 3, Arc::clone(&clock));

        assert!(limiter.check("demo-client"));
        clock.advance(Duration::from_secs(3600));
        assert!(limiter.check("demo-client"));

        let tokens = limiter.tokens("demo-client").unwrap();
        assert!((0.0..=3.0).contains(&tokens));
        assert!((tokens - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_tokens_never_negative() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(1.0, 1, clock);

        assert!(limiter.check("demo-client"));
        for _ in 0..10 {
            limiter.check("demo-client");
            let tokens = limiter.tokens("demo-client").unwrap();
            assert!(tokens >= 0.0);
        }
    }

    #[test]
    fn test_identities_limited_independently() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(1.0, 1, clock);

        assert!(limiter.check("alice"));
        assert!(!limiter.check("alice"));
        assert!(limiter.check("bob"));
    }

    #[test]
    fn test_concurrent_checks_admit_exactly_capacity() {
        let clock = Arc::new(ManualClock::new());
        let limiter = Arc::new(limiter(0.001, 1, clock));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.check("demo-client"))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn test_idle_bucket_evicted_and_recreated_full() {
        let clock = Arc::new(ManualClock::new());
        let config = LimitConfig {
            local_rate: 0.001,
            local_capacity: 2,
            idle_timeout_secs: 60,
            ..LimitConfig::default()
        };
        let limiter = LocalRateLimiter::new(&config, Arc::clone(&clock) as Arc<dyn Clock>);

        assert!(limiter.check("demo-client"));
        assert!(limiter.check("demo-client"));
        assert!(!limiter.check("demo-client"));
        assert_eq!(limiter.tracked_identities(), 1);

        clock.advance(Duration::from_secs(120));
        limiter.evict_idle();
        assert_eq!(limiter.tracked_identities(), 0);

        // Recreated bucket starts full again.
        assert!(limiter.check("demo-client"));
        assert!(limiter.check("demo-client"));
    }

    #[test]
    fn test_eviction_tolerates_concurrent_inserts() {
        let clock = Arc::new(ManualClock::new());
        let limiter = Arc::new(limiter(100.0, 100, Arc::clone(&clock)));
        clock.advance(Duration::from_secs(301));

        // Hammer eviction while other threads insert fresh buckets; the
        // eviction accounting must never panic.
        let inserters: Vec<_> = (0..4)
            .map(|i| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    for j in 0..200 {
                        limiter.check(&format!("client-{}-{}", i, j));
                    }
                })
            })
            .collect();
        for _ in 0..50 {
            limiter.evict_idle();
        }
        for handle in inserters {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_eviction_spares_active_buckets() {
        let clock = Arc::new(ManualClock::new());
        let config = LimitConfig {
            local_rate: 100.0,
            local_capacity: 100,
            idle_timeout_secs: 60,
            ..LimitConfig::default()
        };
        let limiter = LocalRateLimiter::new(&config, Arc::clone(&clock) as Arc<dyn Clock>);

        limiter.check("stale");
        clock.advance(Duration::from_secs(59));
        limiter.check("active");
        clock.advance(Duration::from_secs(2));

        limiter.evict_idle();
        assert_eq!(limiter.tracked_identities(), 1);
        assert!(limiter.tokens("active").is_some());
        assert!(limiter.tokens("stale").is_none());
    }
}
