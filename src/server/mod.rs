//! HTTP server implementation
//!
//! This module provides the HTTP server, the admission middleware, and the
//! proxy handler.

pub mod builder;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;

pub use server::HttpServer;
pub use state::AppState;
