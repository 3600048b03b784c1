//! Role-gated route guard.
//!
//! Pure decision over the latest [`Session`] snapshot. Re-evaluate whenever
//! the session or the requested location changes.

use std::collections::HashSet;

use serde::Serialize;

use crate::{Fallback, FallbackTable, Role, Session};

/// Login view; unauthenticated navigations are sent here.
pub const LOGIN_PATH: &str = "/login";

/// Input to a guard decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRequest {
    pub required_roles: HashSet<Role>,
    /// Path (and query, if any) the user asked for.
    pub requested_path: String,
}

impl GuardRequest {
    pub fn new<I>(required_roles: I, requested_path: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        Self {
            required_roles: required_roles.into_iter().collect(),
            requested_path: requested_path.into(),
        }
    }
}

/// Navigation the guard asks for instead of rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub to: String,
    /// Replace the current history entry; the blocked page is not reachable via "back".
    pub replace: bool,
    /// Location to return to after the target flow (login) completes.
    pub return_to: Option<String>,
}

/// Render outcome for a protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session still resolving: show a placeholder, no content, no redirect.
    Loading,
    Redirect(Redirect),
    /// Signed in without the required role and no fallback is configured for it.
    Forbidden,
    /// Pass through to the protected content.
    Render,
}

impl GuardOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            GuardOutcome::Loading => "loading",
            GuardOutcome::Redirect(_) => "redirect",
            GuardOutcome::Forbidden => "forbidden",
            GuardOutcome::Render => "render",
        }
    }
}

/// Decide the outcome of a navigation. First matching rule wins:
///
/// 1. session loading → [`GuardOutcome::Loading`]
/// 2. no user or no profile → redirect to login, carrying the requested path
/// 3. role not required → redirect to the role's fallback
/// 4. otherwise → [`GuardOutcome::Render`]
pub fn evaluate(session: &Session, request: &GuardRequest, fallbacks: &FallbackTable) -> GuardOutcome {
    evaluate_with_login(session, request, fallbacks, LOGIN_PATH)
}

fn evaluate_with_login(
    session: &Session,
    request: &GuardRequest,
    fallbacks: &FallbackTable,
    login_path: &str,
) -> GuardOutcome {
    if session.loading {
        return GuardOutcome::Loading;
    }

    let profile = match (&session.user, &session.profile) {
        (Some(_), Some(profile)) => profile,
        _ => {
            return GuardOutcome::Redirect(Redirect {
                to: login_path.to_string(),
                replace: true,
                return_to: Some(request.requested_path.clone()),
            });
        }
    };

    if request.required_roles.contains(&profile.role) {
        return GuardOutcome::Render;
    }

    match fallbacks.fallback_for(&profile.role) {
        Fallback::Path(to) => GuardOutcome::Redirect(Redirect {
            to,
            replace: true,
            return_to: None,
        }),
        Fallback::Deny => GuardOutcome::Forbidden,
    }
}

/// A route's access requirements, declared once and evaluated per request.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    required_roles: HashSet<Role>,
    fallbacks: FallbackTable,
    login_path: String,
}

impl RoleGuard {
    pub fn new<I>(required_roles: I) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        Self {
            required_roles: required_roles.into_iter().collect(),
            fallbacks: FallbackTable::default(),
            login_path: LOGIN_PATH.to_string(),
        }
    }

    pub fn with_fallbacks(mut self, fallbacks: FallbackTable) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn evaluate(&self, session: &Session, requested_path: &str) -> GuardOutcome {
        let request = GuardRequest {
            required_roles: self.required_roles.clone(),
            requested_path: requested_path.to_string(),
        };
        let outcome = evaluate_with_login(session, &request, &self.fallbacks, &self.login_path);
        tracing::debug!(
            path = requested_path,
            outcome = outcome.kind(),
            role = session.role().map(Role::as_str),
            "route guard decision"
        );
        outcome
    }
}
