//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::forward::Forwarder;
use crate::metrics::GatewayMetrics;
use crate::pipeline::AdmissionPipeline;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// All fields are wrapped in Arc for efficient sharing across workers. The
/// pipeline owns the only cross-request mutable state in the process: the
/// local bucket table.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Admission pipeline applied to every non-public request
    pub pipeline: Arc<AdmissionPipeline>,
    /// Backend forwarder for admitted requests
    pub forwarder: Arc<Forwarder>,
    /// Request metrics, recorded for every outcome
    pub metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(
        config: Config,
        pipeline: AdmissionPipeline,
        forwarder: Forwarder,
        metrics: GatewayMetrics,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            forwarder: Arc::new(forwarder),
            metrics: Arc::new(metrics),
        }
    }
}
