//! Admission control middleware
//!
//! Runs the admission pipeline before the inner service: credential
//! verification, local bucket check, then the cluster-wide window check.
//! Rejections are converted to gateway error responses and never reach the
//! proxy handler.

use crate::error::GatewayError;
use crate::pipeline::AdmissionDecision;
use crate::server::middleware::helpers::{extract_bearer, is_public_route};
use crate::server::state::AppState;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::{HttpMessage, web};
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use tracing::debug;

/// Verified caller identity, attached to admitted requests
#[derive(Debug, Clone)]
pub struct Identity(pub String);

/// Admission middleware for Actix-web
pub struct AdmissionMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AdmissionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AdmissionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdmissionMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

/// Service implementation for admission middleware
pub struct AdmissionMiddlewareService<S> {
    // Rc so the decision can be awaited before the inner call is made
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdmissionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        if is_public_route(req.path()) {
            return Box::pin(async move { service.call(req).await });
        }

        let credential = extract_bearer(req.headers());
        let app_state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let Some(state) = app_state else {
                return Err(GatewayError::internal("Missing application state").into());
            };

            match state.pipeline.admit(credential.as_deref()).await {
                AdmissionDecision::Admitted { identity } => {
                    debug!("Admitted request for {}", identity);
                    req.extensions_mut().insert(Identity(identity));
                    service.call(req).await
                }
                AdmissionDecision::Rejected(rejection) => {
                    Err(GatewayError::from(rejection).into())
                }
            }
        })
    }
}
