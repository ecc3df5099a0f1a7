//! HTTP route handlers

use crate::error::Result;
use crate::server::state::AppState;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

/// Health check endpoint handler
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus metrics endpoint handler
pub async fn metrics(state: web::Data<AppState>) -> Result<HttpResponse> {
    let body = state.metrics.export()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

/// Catch-all proxy handler
///
/// Requests reaching this handler have already passed the admission pipeline
/// in the middleware; this relays them to the backend and the backend's
/// response to the client.
pub async fn proxy(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path());

    let forwarded = state
        .forwarder
        .forward(req.method(), path_and_query, req.headers(), body)
        .await?;

    let mut response = HttpResponse::build(
        actix_web::http::StatusCode::from_u16(forwarded.status)
            .unwrap_or(actix_web::http::StatusCode::BAD_GATEWAY),
    );
    for (name, value) in &forwarded.headers {
        response.insert_header((name.as_str(), value.as_slice()));
    }

    Ok(response.body(forwarded.body))
}
