use axum::{Json, http::StatusCode, response::IntoResponse};

use crate::app::dto::SessionSummary;
use crate::context::{CurrentOrganization, CurrentSession};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    CurrentSession(session): CurrentSession,
    CurrentOrganization(tenant): CurrentOrganization,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "session": SessionSummary::from(&session),
        "tenant": tenant,
    }))
}
