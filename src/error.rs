//! Error types for the gateway

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Redis errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Metrics registry errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Authentication errors (missing or invalid credential)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Per-process token bucket exhausted
    #[error("Rate limit exceeded: {0}")]
    LocalRateLimit(String),

    /// Cluster-wide window limit exhausted
    #[error("Rate limit exceeded: {0}")]
    GlobalRateLimit(String),

    /// Shared counter store unreachable or timed out
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),

    /// Backend unreachable or connection failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Backend did not respond within the configured timeout
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::Auth(_) | GatewayError::Jwt(_) => {
                (StatusCode::UNAUTHORIZED, "AUTH_ERROR")
            }
            GatewayError::LocalRateLimit(_) => {
                (StatusCode::TOO_MANY_REQUESTS, "LOCAL_RATE_LIMIT")
            }
            GatewayError::GlobalRateLimit(_) => {
                (StatusCode::TOO_MANY_REQUESTS, "GLOBAL_RATE_LIMIT")
            }
            // Store faults are handled by the outage policy before a response
            // is built; reaching here means an unexpected infrastructure error.
            GatewayError::StoreUnavailable(_) | GatewayError::Redis(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
            }
            GatewayError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            GatewayError::UpstreamTimeout(_) => {
                (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT")
            }
            GatewayError::HttpClient(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            GatewayError::Timeout(_) => (StatusCode::REQUEST_TIMEOUT, "TIMEOUT"),
            GatewayError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn public_message(&self) -> String {
        match self {
            GatewayError::StoreUnavailable(_) | GatewayError::Redis(_) => {
                "Counter store operation failed".to_string()
            }
            GatewayError::HttpClient(_) => "Backend request failed".to_string(),
            GatewayError::Auth(_)
            | GatewayError::Jwt(_)
            | GatewayError::LocalRateLimit(_)
            | GatewayError::GlobalRateLimit(_)
            | GatewayError::Upstream(_)
            | GatewayError::UpstreamTimeout(_)
            | GatewayError::Timeout(_)
            | GatewayError::Config(_) => self.to_string(),
            _ => "An internal error occurred".to_string(),
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        self.status_and_code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code) = self.status_and_code();

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message: self.public_message(),
                timestamp: chrono::Utc::now().timestamp(),
            },
        };

        HttpResponse::build(status_code).json(error_response)
    }
}

/// Standard error response format
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
}
