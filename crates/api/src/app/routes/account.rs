//! Session and tenant lifecycle events reported by the frontend.
//!
//! Sign-in itself happens at the identity provider; these endpoints keep the
//! provider caches in step with it.

use axum::{
    Extension, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app::dto::SessionSummary;
use crate::app::errors::json_error;
use crate::context::{CurrentScope, CurrentSession};
use crate::middleware::RequestState;

/// Forget the caller's cached profile. The token is revoked by the identity provider.
pub async fn logout(
    Extension(state): Extension<RequestState>,
    CurrentSession(session): CurrentSession,
) -> StatusCode {
    if let Some(user) = session.session().user {
        state.services.sessions.forget(user);
        tracing::info!(%user, "signed out");
    }
    StatusCode::NO_CONTENT
}

/// Look the caller's profile up again (after sign-in or a profile change).
pub async fn refresh_session(
    Extension(state): Extension<RequestState>,
    CurrentSession(session): CurrentSession,
) -> Json<SessionSummary> {
    let Some(user) = session.session().user else {
        return Json(SessionSummary::from(&session));
    };

    let refreshed = state
        .services
        .sessions
        .refresh(user, state.resolve_wait)
        .await;
    Json(SessionSummary::from(&session.with_session(refreshed)))
}

/// Re-resolve the current organization (branding edited elsewhere).
pub async fn refresh_organization(
    Extension(state): Extension<RequestState>,
    CurrentScope(scope): CurrentScope,
) -> Response {
    let Some(key) = scope.key() else {
        return json_error(
            StatusCode::NOT_FOUND,
            "no_tenant",
            "request does not target an organization",
        );
    };

    let tenant = state
        .services
        .tenants
        .refresh(key)
        .settled_state(state.resolve_wait)
        .await;
    Json(tenant).into_response()
}
