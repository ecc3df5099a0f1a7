//! # rategate
//!
//! An admission-control API gateway. Every inbound request passes a fixed
//! pipeline: bearer credential verification, a per-process token bucket, and
//! a cluster-wide fixed-window limit coordinated through a shared Redis
//! counter. Admitted requests are proxied to the backend service; rejections
//! carry a distinguishable reason (401 for credential failures, 429 with a
//! local/global code for rate limits, 502/504 for upstream failures).
//!
//! ## Gateway mode
//!
//! ```rust,no_run
//! use rategate::{Config, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Some("config/gateway.yaml"))?;
//!     let gateway = Gateway::new(config).await?;
//!     gateway.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod error;
pub mod forward;
pub mod limit;
pub mod metrics;
pub mod pipeline;
pub mod server;

// Re-export main types
pub use config::Config;
pub use error::{GatewayError, Result};
pub use pipeline::{AdmissionDecision, AdmissionPipeline, Rejection};

use tracing::info;

/// A minimal gateway wrapper around the HTTP server
pub struct Gateway {
    server: server::HttpServer,
}

impl Gateway {
    /// Create a new gateway instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating new gateway instance");
        let server = server::HttpServer::new(&config).await?;
        Ok(Self { server })
    }

    /// Run the gateway server
    pub async fn run(self) -> Result<()> {
        info!("Starting gateway");
        self.server.start().await
    }
}

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
