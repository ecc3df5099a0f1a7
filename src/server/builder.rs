//! Server builder and run_server function

use crate::config::Config;
use crate::error::Result;
use crate::server::server::HttpServer;
use std::env;
use tracing::info;

/// Default configuration file location
const DEFAULT_CONFIG_PATH: &str = "config/gateway.yaml";

/// Run the server with automatic configuration loading
///
/// Reads the configuration file named by `GATEWAY_CONFIG` (falling back to
/// `config/gateway.yaml`, then to defaults), applies environment overrides,
/// and starts the server.
pub async fn run_server() -> Result<()> {
    let config_path =
        env::var("GATEWAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(Some(&config_path))?;

    info!(
        "Gateway starting at http://{}:{}",
        config.server.host, config.server.port
    );
    info!("Forwarding admitted requests to {}", config.backend.url);

    let server = HttpServer::new(&config).await?;
    server.start().await
}
