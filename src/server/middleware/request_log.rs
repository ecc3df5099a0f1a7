//! Request logging and metrics middleware
//!
//! Outermost middleware: logs and records every outcome, including requests
//! the admission middleware rejects. Those surface here as errors, so the
//! status is derived from the error's response mapping rather than lost.

use crate::server::middleware::admission::Identity;
use crate::server::state::AppState;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::{HttpMessage, web};
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::info;

/// Request log middleware for Actix-web
pub struct RequestLogMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestLogMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequestLogMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLogMiddlewareService { service }))
    }
}

/// Service implementation for request log middleware
pub struct RequestLogMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLogMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let app_state = req.app_data::<web::Data<AppState>>().cloned();

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let elapsed = start_time.elapsed();

            // Rejections never produce a ServiceResponse here; their status
            // comes from the error's response mapping.
            let status = match &result {
                Ok(res) => res.status().as_u16(),
                Err(err) => err.as_response_error().status_code().as_u16(),
            };

            if let Some(state) = &app_state {
                state.metrics.record(&method, &path, status, elapsed);
            }

            let identity = match &result {
                Ok(res) => res
                    .request()
                    .extensions()
                    .get::<Identity>()
                    .map(|id| id.0.clone()),
                Err(_) => None,
            };
            match identity {
                Some(identity) => info!(
                    "{} {} -> {} in {:?} for {}",
                    method, path, status, elapsed, identity
                ),
                None => info!("{} {} -> {} in {:?}", method, path, status, elapsed),
            }

            result
        })
    }
}
