use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// A handler asked for request context that its route was never wired to provide.
///
/// Not recoverable at runtime: logged loudly and answered with a 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringRejection {
    message: String,
    path: String,
}

impl WiringRejection {
    pub fn new(message: impl Into<String>, path: &str) -> Self {
        Self {
            message: message.into(),
            path: path.to_string(),
        }
    }
}

impl IntoResponse for WiringRejection {
    fn into_response(self) -> Response {
        tracing::error!(path = %self.path, "route wiring error: {}", self.message);
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "wiring_error", self.message)
    }
}
