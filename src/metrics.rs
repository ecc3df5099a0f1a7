//! Prometheus metrics
//!
//! Request count, latency, and rate-limited rejection counters, exported in
//! the Prometheus text format at `/metrics`. Every request outcome is
//! recorded, including rejections that never reach the proxy handler.

use crate::error::Result;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Registry and instruments for the gateway's request metrics
///
/// Owns its own registry rather than the process-global one, so several
/// gateway instances (or test apps) never collide on registration.
pub struct GatewayMetrics {
    registry: Registry,
    requests: IntCounterVec,
    latency: HistogramVec,
    rate_limited: IntCounterVec,
}

impl GatewayMetrics {
    /// Create and register the instruments
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "status"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "Request latency (s)"),
            &["endpoint"],
        )?;
        let rate_limited = IntCounterVec::new(
            Opts::new(
                "http_rate_limited_total",
                "Number of requests rejected due to rate limiting",
            ),
            &["endpoint"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;
        registry.register(Box::new(rate_limited.clone()))?;

        Ok(Self {
            registry,
            requests,
            latency,
            rate_limited,
        })
    }

    /// Record one finished request, admitted or rejected
    pub fn record(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        self.requests
            .with_label_values(&[method, endpoint, &status.to_string()])
            .inc();
        self.latency
            .with_label_values(&[endpoint])
            .observe(elapsed.as_secs_f64());
        if status == 429 {
            self.rate_limited.with_label_values(&[endpoint]).inc();
        }
    }

    /// Export all metrics in the Prometheus text exposition format
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}
