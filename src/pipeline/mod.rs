//! Admission pipeline
//!
//! Orchestrates the per-request decision: Verify -> LocalCheck -> GlobalCheck,
//! terminal on the first rejection. No stage is retried, and a rejection at
//! any stage leaves earlier, already-consumed limiter tokens spent.

use crate::auth::{RejectReason, TokenVerifier};
use crate::config::Config;
use crate::error::GatewayError;
use crate::limit::{Clock, CounterStore, GlobalRateLimiter, GlobalVerdict, LocalRateLimiter};
use std::sync::Arc;
use tracing::debug;

/// Per-request admission decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// All checks passed; the request may be forwarded
    Admitted {
        /// Verified caller identity
        identity: String,
    },
    /// A check failed; the request is terminal
    Rejected(Rejection),
}

/// Why a request was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No bearer credential on the request
    MissingCredential,
    /// Credential failed verification
    InvalidCredential(RejectReason),
    /// Per-process token bucket exhausted
    LocalLimit,
    /// Cluster-wide window limit exhausted
    GlobalLimit,
}

impl From<Rejection> for GatewayError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::MissingCredential => GatewayError::auth("Missing bearer token"),
            Rejection::InvalidCredential(reason) => {
                GatewayError::Auth(format!("Invalid token: {}", reason.code()))
            }
            Rejection::LocalLimit => {
                GatewayError::LocalRateLimit("Too many requests (local limit)".to_string())
            }
            Rejection::GlobalLimit => {
                GatewayError::GlobalRateLimit("Too many requests (global limit)".to_string())
            }
        }
    }
}

/// The ordered admission checks applied to every request
pub struct AdmissionPipeline {
    verifier: TokenVerifier,
    local: LocalRateLimiter,
    global: GlobalRateLimiter,
}

impl AdmissionPipeline {
    /// Build the pipeline from configuration plus injected store and clock
    pub fn new(config: &Config, store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            verifier: TokenVerifier::new(&config.auth),
            local: LocalRateLimiter::new(&config.limits, Arc::clone(&clock)),
            global: GlobalRateLimiter::new(&config.limits, store, clock),
        }
    }

    /// Run the admission checks for one request
    ///
    /// A local rejection short-circuits before the global check, so it never
    /// consumes cluster-wide budget.
    pub async fn admit(&self, credential: Option<&str>) -> AdmissionDecision {
        let Some(token) = credential else {
            return AdmissionDecision::Rejected(Rejection::MissingCredential);
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(reason) => {
                return AdmissionDecision::Rejected(Rejection::InvalidCredential(reason));
            }
        };

        if !self.local.check(&claims.sub) {
            return AdmissionDecision::Rejected(Rejection::LocalLimit);
        }

        match self.global.check(&claims.sub).await {
            GlobalVerdict::Admitted => {
                debug!("Request admitted for {}", claims.sub);
                AdmissionDecision::Admitted {
                    identity: claims.sub,
                }
            }
            GlobalVerdict::LimitExceeded => AdmissionDecision::Rejected(Rejection::GlobalLimit),
        }
    }

    /// Discard idle local buckets; called from the background eviction task
    pub fn evict_idle_buckets(&self) {
        self.local.evict_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutagePolicy;
    use crate::limit::{ManualClock, MemoryCounterStore};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    const SECRET: &str = "supersecretkey";

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn token_for(sub: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": sub, "exp": now_secs() + 300 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn expired_token(sub: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": sub, "exp": now_secs() - 60 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn test_config(local_rate: f64, local_capacity: u32, global_limit: i64) -> Config {
        let mut config = Config::default();
        config.auth.jwt_secret = SECRET.to_string();
        config.limits.local_rate = local_rate;
        config.limits.local_capacity = local_capacity;
        config.limits.global_limit = global_limit;
        config.limits.global_window_secs = 1;
        config.limits.on_store_unreachable = OutagePolicy::FailOpen;
        config
    }

    fn pipeline_with(
        config: &Config,
        store: Arc<MemoryCounterStore>,
        clock: Arc<ManualClock>,
    ) -> AdmissionPipeline {
        AdmissionPipeline::new(config, store, clock)
    }

    #[tokio::test]
    async fn test_missing_credential_rejected_first() {
        let config = test_config(5.0, 5, 10);
        let store = Arc::new(MemoryCounterStore::new());
        let pipeline = pipeline_with(&config, Arc::clone(&store), Arc::new(ManualClock::new()));

        let decision = pipeline.admit(None).await;
        assert_eq!(
            decision,
            AdmissionDecision::Rejected(Rejection::MissingCredential)
        );
        assert_eq!(store.get("rate:demo-client:0"), None);
    }

    #[tokio::test]
    async fn test_invalid_credential_rejected_regardless_of_limiter_state() {
        let config = test_config(5.0, 5, 10);
        let store = Arc::new(MemoryCounterStore::new());
        let pipeline = pipeline_with(&config, store, Arc::new(ManualClock::new()));

        // Exhaust the local bucket first; an expired token must still be a
        // credential rejection, not a rate limit one.
        let good = token_for("demo-client");
        for _ in 0..5 {
            pipeline.admit(Some(&good)).await;
        }

        let decision = pipeline.admit(Some(&expired_token("demo-client"))).await;
        assert_eq!(
            decision,
            AdmissionDecision::Rejected(Rejection::InvalidCredential(RejectReason::Expired))
        );
    }

    #[tokio::test]
    async fn test_local_rejection_short_circuits_global() {
        let config = test_config(0.001, 1, 10);
        let store = Arc::new(MemoryCounterStore::new());
        let clock = Arc::new(ManualClock::new());
        let pipeline = pipeline_with(&config, Arc::clone(&store), clock);

        let token = token_for("demo-client");
        assert!(matches!(
            pipeline.admit(Some(&token)).await,
            AdmissionDecision::Admitted { .. }
        ));
        assert_eq!(store.get("rate:demo-client:0"), Some(1));

        // Second request fails locally; the shared counter must not move.
        assert_eq!(
            pipeline.admit(Some(&token)).await,
            AdmissionDecision::Rejected(Rejection::LocalLimit)
        );
        assert_eq!(store.get("rate:demo-client:0"), Some(1));
    }

    #[tokio::test]
    async fn test_global_rejection_after_local_admission() {
        let config = test_config(100.0, 100, 2);
        let store = Arc::new(MemoryCounterStore::new());
        let pipeline = pipeline_with(&config, store, Arc::new(ManualClock::new()));

        let token = token_for("demo-client");
        for _ in 0..2 {
            assert!(matches!(
                pipeline.admit(Some(&token)).await,
                AdmissionDecision::Admitted { .. }
            ));
        }
        assert_eq!(
            pipeline.admit(Some(&token)).await,
            AdmissionDecision::Rejected(Rejection::GlobalLimit)
        );
    }

    #[tokio::test]
    async fn test_burst_scenario_local_gates_before_global() {
        // local_rate=5/s, capacity=5, global_limit=10: a 20-request burst is
        // admitted 5 times by the local bucket, the rest rejected locally,
        // and all 5 admitted requests pass the global window.
        let config = test_config(5.0, 5, 10);
        let store = Arc::new(MemoryCounterStore::new());
        let pipeline = pipeline_with(&config, Arc::clone(&store), Arc::new(ManualClock::new()));

        let token = token_for("demo-client");
        let mut admitted = 0;
        let mut local_rejections = 0;
        for _ in 0..20 {
            match pipeline.admit(Some(&token)).await {
                AdmissionDecision::Admitted { .. } => admitted += 1,
                AdmissionDecision::Rejected(Rejection::LocalLimit) => local_rejections += 1,
                other => panic!("unexpected decision: {:?}", other),
            }
        }

        assert_eq!(admitted, 5);
        assert_eq!(local_rejections, 15);
        assert_eq!(store.get("rate:demo-client:0"), Some(5));
    }

    #[tokio::test]
    async fn test_admitted_decision_carries_identity() {
        let config = test_config(5.0, 5, 10);
        let store = Arc::new(MemoryCounterStore::new());
        let pipeline = pipeline_with(&config, store, Arc::new(ManualClock::new()));

        let decision = pipeline.admit(Some(&token_for("alice"))).await;
        assert_eq!(
            decision,
            AdmissionDecision::Admitted {
                identity: "alice".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_bucket_eviction_reachable_through_pipeline() {
        let mut config = test_config(0.001, 1, 10);
        config.limits.idle_timeout_secs = 60;
        let store = Arc::new(MemoryCounterStore::new());
        let clock = Arc::new(ManualClock::new());
        let pipeline = pipeline_with(&config, store, Arc::clone(&clock));

        let token = token_for("demo-client");
        pipeline.admit(Some(&token)).await;
        assert_eq!(
            pipeline.admit(Some(&token)).await,
            AdmissionDecision::Rejected(Rejection::LocalLimit)
        );

        clock.advance(Duration::from_secs(120));
        pipeline.evict_idle_buckets();
        assert!(matches!(
            pipeline.admit(Some(&token)).await,
            AdmissionDecision::Admitted { .. }
        ));
    }

    #[test]
    fn test_rejection_error_mapping() {
        let err: GatewayError = Rejection::LocalLimit.into();
        assert!(matches!(err, GatewayError::LocalRateLimit(_)));

        let err: GatewayError = Rejection::GlobalLimit.into();
        assert!(matches!(err, GatewayError::GlobalRateLimit(_)));

        let err: GatewayError = Rejection::MissingCredential.into();
        assert!(matches!(err, GatewayError::Auth(_)));
    }
}
