//! Request context middleware: session first, then tenant.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use congregate_auth::JwtValidator;
use congregate_tenant::TenantLocator;

use crate::app::services::AppServices;
use crate::context::SessionContext;

/// Header naming the organization slug explicitly (tenant switcher, API clients).
pub const ORGANIZATION_HEADER: &str = "x-organization";

#[derive(Clone)]
pub struct RequestState {
    pub jwt: Arc<dyn JwtValidator>,
    pub services: AppServices,
    pub locator: TenantLocator,
    pub resolve_wait: Duration,
}

/// Resolve the session of the caller.
///
/// A missing, malformed or expired token is not an error here: the request
/// continues anonymously and the guard decides what that means for the route.
pub async fn session_middleware(
    State(state): State<RequestState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let claims = extract_bearer(req.headers()).and_then(|token| {
        state
            .jwt
            .validate(token, Utc::now())
            .map_err(|e| tracing::debug!(error = %e, "ignoring invalid bearer token"))
            .ok()
    });

    let session = state
        .services
        .sessions
        .settled_session(claims.as_ref(), state.resolve_wait)
        .await;

    req.extensions_mut().insert(SessionContext::new(
        session,
        claims.and_then(|c| c.organization_id),
    ));

    next.run(req).await
}

/// Place the request inside the tenant provider.
///
/// Runs after [`session_middleware`] so the session's organization can serve
/// as the last tenant hint.
pub async fn tenant_middleware(
    State(state): State<RequestState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let headers = req.headers();
    let host = header_str(headers, header::HOST.as_str());
    let explicit = header_str(headers, ORGANIZATION_HEADER);
    let claim = req
        .extensions()
        .get::<SessionContext>()
        .and_then(SessionContext::organization_claim);

    let key = state.locator.locate(host, explicit, claim);
    let scope = state.services.tenants.scope(key);
    scope.settled_state(state.resolve_wait).await;

    req.extensions_mut().insert(scope);
    next.run(req).await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let token = header_str(headers, header::AUTHORIZATION.as_str())?
        .strip_prefix("Bearer ")?
        .trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
