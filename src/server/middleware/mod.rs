//! HTTP middleware implementations
//!
//! This module provides the middleware for request processing:
//! - Admission control (credential verification and rate limiting)
//! - Request logging

mod admission;
mod helpers;
mod request_log;

// Re-export all middleware
pub use admission::{AdmissionMiddleware, AdmissionMiddlewareService, Identity};
pub use helpers::{extract_bearer, is_public_route};
pub use request_log::{RequestLogMiddleware, RequestLogMiddlewareService};
