//! Gateway configuration models
//!
//! Configuration is loaded from a YAML file, then overridden by environment
//! variables. Every field carries a serde default so a partial file is valid.

mod loader;

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Credential verification configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Rate limiting configuration
    #[serde(default)]
    pub limits: LimitConfig,
    /// Shared counter store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Backend forwarding configuration
    #[serde(default)]
    pub backend: BackendConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Worker count (defaults to the number of CPUs when unset)
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

/// Credential verification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret shared with the token issuer
    #[serde(default)]
    pub jwt_secret: String,
    /// Expected issuer claim; unchecked when unset
    #[serde(default)]
    pub issuer: Option<String>,
    /// Clock skew tolerance in seconds for expiry checks (strict by default)
    #[serde(default)]
    pub leeway_secs: u64,
}

/// Rate limiting configuration for both limiter tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Local bucket refill rate in tokens per second
    #[serde(default = "default_local_rate")]
    pub local_rate: f64,
    /// Local bucket capacity (maximum burst)
    #[serde(default = "default_local_capacity")]
    pub local_capacity: u32,
    /// Idle seconds after which a bucket may be evicted
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Cluster-wide admissions per identity per window
    #[serde(default = "default_global_limit")]
    pub global_limit: i64,
    /// Fixed window size in seconds
    #[serde(default = "default_global_window")]
    pub global_window_secs: u64,
    /// Bound on the counter store round trip in milliseconds
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    /// Policy applied when the counter store is unreachable
    #[serde(default)]
    pub on_store_unreachable: OutagePolicy,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            local_rate: default_local_rate(),
            local_capacity: default_local_capacity(),
            idle_timeout_secs: default_idle_timeout(),
            global_limit: default_global_limit(),
            global_window_secs: default_global_window(),
            store_timeout_ms: default_store_timeout(),
            on_store_unreachable: OutagePolicy::default(),
        }
    }
}

impl LimitConfig {
    /// Fixed window size as a duration
    pub fn global_window(&self) -> Duration {
        Duration::from_secs(self.global_window_secs)
    }

    /// Store round-trip bound as a duration
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Bucket idle threshold as a duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Admission policy when the shared counter store cannot be reached
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutagePolicy {
    /// Admit requests that pass the earlier checks
    #[default]
    FailOpen,
    /// Reject requests as if the global limit were exhausted
    FailClosed,
}

/// Shared counter store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL
    #[serde(default = "default_store_url")]
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
        }
    }
}

/// Backend forwarding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the proxied backend service
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Bound on the backend round trip in milliseconds
    #[serde(default = "default_backend_timeout")]
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_ms: default_backend_timeout(),
        }
    }
}

impl BackendConfig {
    /// Backend round-trip bound as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Validate the configuration before the server starts
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(GatewayError::config(
                "auth.jwt_secret must not be empty (set JWT_SECRET)",
            ));
        }
        if self.limits.local_rate <= 0.0 {
            return Err(GatewayError::config("limits.local_rate must be positive"));
        }
        if self.limits.local_capacity == 0 {
            return Err(GatewayError::config(
                "limits.local_capacity must be at least 1",
            ));
        }
        if self.limits.global_limit <= 0 {
            return Err(GatewayError::config("limits.global_limit must be positive"));
        }
        if self.limits.global_window_secs == 0 {
            return Err(GatewayError::config(
                "limits.global_window_secs must be at least 1",
            ));
        }
        if self.backend.url.is_empty() {
            return Err(GatewayError::config(
                "backend.url must not be empty (set BACKEND_URL)",
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_local_rate() -> f64 {
    100.0
}

fn default_local_capacity() -> u32 {
    100
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_global_limit() -> i64 {
    100
}

fn default_global_window() -> u64 {
    1
}

fn default_store_timeout() -> u64 {
    100
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_backend_timeout() -> u64 {
    10_000
}
