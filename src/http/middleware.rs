//! Admission middleware wrapping every protected route.

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;

use super::response::ApiError;
use crate::ratelimit::AdmissionControl;

/// Per-route middleware state: the route's name and the shared registry.
#[derive(Clone)]
pub struct RouteGuard {
    route: &'static str,
    admission: Arc<AdmissionControl>,
}

impl RouteGuard {
    /// Create the guard for `route`, registering the route with the registry.
    pub fn new(route: &'static str, admission: Arc<AdmissionControl>) -> Self {
        admission.register(route);
        Self { route, admission }
    }
}

/// Forward the request if admission control allows it, otherwise answer
/// 429 without running the handler.
pub async fn admit(State(guard): State<RouteGuard>, request: Request, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if guard.admission.check(guard.route, client) {
        return next.run(request).await;
    }

    ApiError::too_many_requests().into_response()
}
