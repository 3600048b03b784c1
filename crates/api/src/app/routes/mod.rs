use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use congregate_auth::{Role, RoleGuard};

use crate::config::AppConfig;
use crate::guard::require_roles;

pub mod account;
pub mod pages;
pub mod system;

/// Pages and session events that need no signed-in user.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login))
        .route("/logout", post(account::logout))
        .route("/session/refresh", post(account::refresh_session))
}

/// Pages gated by role. Must be mounted inside the session and tenant middleware.
pub fn guarded_router(config: &AppConfig) -> Router {
    let members = Router::new()
        .route("/programs", get(pages::programs))
        .route("/whoami", get(system::whoami))
        .route_layer(from_fn_with_state(
            role_guard(config, &[Role::PARTICIPANT, Role::ADMIN, Role::OWNER]),
            require_roles,
        ));

    let staff = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/reports", get(pages::reports))
        .route("/organization/refresh", post(account::refresh_organization))
        .route_layer(from_fn_with_state(
            role_guard(config, &[Role::ADMIN, Role::OWNER]),
            require_roles,
        ));

    members.merge(staff)
}

fn role_guard(config: &AppConfig, roles: &[Role]) -> RoleGuard {
    RoleGuard::new(roles.iter().cloned()).with_fallbacks(config.fallback_table())
}
