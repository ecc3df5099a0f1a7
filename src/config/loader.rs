//! Configuration loading utilities
//!
//! This module provides loading from a YAML file plus environment overrides.

use super::{Config, OutagePolicy};
use crate::error::{GatewayError, Result};
use std::env;
use std::path::Path;
use tracing::{debug, info};

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, preferring a file when one exists, then apply
    /// environment overrides
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.as_ref().exists() => Self::from_file(p)?,
            Some(p) => {
                debug!(
                    "Config file {} not found, using defaults",
                    p.as_ref().display()
                );
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) -> Result<()> {
        debug!("Applying environment overrides to configuration");

        if let Ok(host) = env::var("GATEWAY_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("GATEWAY_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| GatewayError::Config(format!("Invalid GATEWAY_PORT: {}", e)))?;
        }

        if let Ok(secret) = env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(issuer) = env::var("JWT_ISSUER") {
            self.auth.issuer = Some(issuer);
        }

        if let Ok(url) = env::var("REDIS_URL") {
            self.store.url = url;
        }
        if let Ok(url) = env::var("BACKEND_URL") {
            self.backend.url = url;
        }

        if let Ok(rate) = env::var("LOCAL_RATE") {
            self.limits.local_rate = rate
                .parse()
                .map_err(|e| GatewayError::Config(format!("Invalid LOCAL_RATE: {}", e)))?;
        }
        if let Ok(capacity) = env::var("LOCAL_CAPACITY") {
            self.limits.local_capacity = capacity
                .parse()
                .map_err(|e| GatewayError::Config(format!("Invalid LOCAL_CAPACITY: {}", e)))?;
        }
        if let Ok(limit) = env::var("GLOBAL_RATE") {
            self.limits.global_limit = limit
                .parse()
                .map_err(|e| GatewayError::Config(format!("Invalid GLOBAL_RATE: {}", e)))?;
        }
        if let Ok(window) = env::var("GLOBAL_WINDOW_SECS") {
            self.limits.global_window_secs = window
                .parse()
                .map_err(|e| GatewayError::Config(format!("Invalid GLOBAL_WINDOW_SECS: {}", e)))?;
        }
        if let Ok(policy) = env::var("STORE_UNREACHABLE_POLICY") {
            self.limits.on_store_unreachable = match policy.as_str() {
                "fail_open" => OutagePolicy::FailOpen,
                "fail_closed" => OutagePolicy::FailClosed,
                other => {
                    return Err(GatewayError::Config(format!(
                        "Invalid STORE_UNREACHABLE_POLICY: {} (expected fail_open or fail_closed)",
                        other
                    )));
                }
            };
        }

        Ok(())
    }
}
