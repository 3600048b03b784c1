//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: session/tenant providers and their directories
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: view payloads
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, middleware::from_fn_with_state, routing::get};
use tower::ServiceBuilder;

use congregate_auth::Hs256JwtValidator;
use congregate_tenant::TenantLocator;

use crate::config::AppConfig;
use crate::middleware::{self, RequestState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig, services: AppServices) -> Router {
    let state = RequestState {
        jwt: Arc::new(Hs256JwtValidator::new(config.jwt_secret.as_bytes())),
        services,
        locator: TenantLocator::new(config.base_domain.clone()),
        resolve_wait: config.resolve_wait,
    };

    // Every page sees a session and a tenant scope; guarded pages also see the guard.
    let pages = routes::public_router()
        .merge(routes::guarded_router(config))
        .layer(
            ServiceBuilder::new()
                .layer(Extension(state.clone()))
                .layer(from_fn_with_state(state.clone(), middleware::session_middleware))
                .layer(from_fn_with_state(state, middleware::tenant_middleware)),
        );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(pages)
}
