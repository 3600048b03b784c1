//! HTTP rendering of route guard decisions.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect as HttpRedirect, Response},
};
use serde_json::json;

use congregate_auth::{GuardOutcome, Redirect, RoleGuard};

use crate::app::errors::{WiringRejection, json_error};
use crate::context::SessionContext;

/// Query parameter carrying the post-login return location.
pub const RETURN_TO_PARAM: &str = "redirect_to";

/// Gate the wrapped routes with `guard`.
///
/// Must run inside the session middleware.
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(ctx) = req.extensions().get::<SessionContext>() else {
        return WiringRejection::new("route guard mounted outside of the session middleware", req.uri().path())
            .into_response();
    };

    let requested = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    match guard.evaluate(ctx.session(), &requested) {
        GuardOutcome::Render => next.run(req).await,
        outcome => outcome_response(outcome),
    }
}

/// Map a non-render outcome to a response.
pub fn outcome_response(outcome: GuardOutcome) -> Response {
    match outcome {
        GuardOutcome::Loading => (
            StatusCode::ACCEPTED,
            [(header::RETRY_AFTER, "1")],
            Json(json!({ "status": "loading" })),
        )
            .into_response(),
        // 303: the blocked URL never becomes a history entry of its own.
        GuardOutcome::Redirect(redirect) => HttpRedirect::to(&redirect_location(&redirect)).into_response(),
        GuardOutcome::Forbidden => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "no destination is configured for this role",
        ),
        GuardOutcome::Render => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "render outcome has no redirect response",
        ),
    }
}

/// Target URL of a redirect, with the return location as query parameter.
pub fn redirect_location(redirect: &Redirect) -> String {
    let Some(return_to) = &redirect.return_to else {
        return redirect.to.clone();
    };

    match serde_urlencoded::to_string([(RETURN_TO_PARAM, return_to.as_str())]) {
        Ok(query) => format!("{}?{}", redirect.to, query),
        Err(e) => {
            tracing::warn!(error = %e, "could not encode return location");
            redirect.to.clone()
        }
    }
}

/// Accept only same-origin absolute paths as return locations.
pub fn sanitize_return_to(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.starts_with('/') && !raw.starts_with("//") && !raw.contains('\\') {
        Some(raw.to_string())
    } else {
        None
    }
}
