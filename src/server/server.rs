//! HTTP server core implementation
//!
//! This module provides the HttpServer struct and its core methods.

use crate::config::{Config, ServerConfig};
use crate::error::{GatewayError, Result};
use crate::forward::Forwarder;
use crate::limit::{Clock, CounterStore, RedisCounterStore, SystemClock};
use crate::metrics::GatewayMetrics;
use crate::pipeline::AdmissionPipeline;
use crate::server::handlers::{health_check, metrics, proxy};
use crate::server::middleware::{AdmissionMiddleware, RequestLogMiddleware};
use crate::server::state::AppState;
use actix_web::{App, HttpServer as ActixHttpServer, web};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server backed by the Redis counter store
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");
        config.validate()?;

        let store = RedisCounterStore::connect(&config.store).await?;
        store.ping().await?;

        Self::with_store(config, Arc::new(store))
    }

    /// Create a new HTTP server with an injected counter store
    ///
    /// Used by tests and by deployments without a shared store.
    pub fn with_store(config: &Config, store: Arc<dyn CounterStore>) -> Result<Self> {
        config.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let pipeline = AdmissionPipeline::new(config, store, clock);
        let forwarder = Forwarder::new(&config.backend)?;
        let gateway_metrics = GatewayMetrics::new()?;
        let state = AppState::new(config.clone(), pipeline, forwarder, gateway_metrics);

        Ok(Self {
            config: config.server.clone(),
            state,
        })
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);
        Self::spawn_bucket_eviction(&state);

        let workers = self.config.workers;
        let app_state = state.clone();
        let mut server = ActixHttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .wrap(AdmissionMiddleware)
                .wrap(RequestLogMiddleware)
                .route("/health", web::get().to(health_check))
                .route("/metrics", web::get().to(metrics))
                .default_service(web::route().to(proxy))
        })
        .bind(&bind_addr)
        .map_err(|e| GatewayError::Config(format!("Failed to bind {}: {}", bind_addr, e)))?;

        if let Some(workers) = workers {
            server = server.workers(workers);
        }

        info!("HTTP server listening on {}", bind_addr);
        server
            .run()
            .await
            .map_err(|e| GatewayError::internal(format!("Server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Periodically discard idle local buckets so the table stays bounded
    fn spawn_bucket_eviction(state: &web::Data<AppState>) {
        let pipeline = Arc::clone(&state.pipeline);
        let period = Duration::from_secs(state.config.limits.idle_timeout_secs.max(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                debug!("Running local bucket eviction");
                pipeline.evict_idle_buckets();
            }
        });
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
