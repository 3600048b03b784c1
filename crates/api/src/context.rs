use axum::{extract::FromRequestParts, http::request::Parts};

use congregate_auth::Session;
use congregate_core::OrganizationId;
use congregate_tenant::{TenantScope, TenantState, use_organization};

use crate::app::errors::WiringRejection;

/// Session context for a request.
///
/// Inserted by the session middleware; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session: Session,
    token_organization: Option<OrganizationId>,
}

impl SessionContext {
    pub fn new(session: Session, token_organization: Option<OrganizationId>) -> Self {
        Self {
            session,
            token_organization,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Same request, with `session` swapped in (after a refresh).
    pub fn with_session(&self, session: Session) -> Self {
        Self {
            session,
            token_organization: self.token_organization,
        }
    }

    /// Organization the session points at: the profile's, else the token's.
    pub fn organization_claim(&self) -> Option<OrganizationId> {
        self.session.organization_ref().or(self.token_organization)
    }
}

/// Tenant state of the current request.
///
/// Only available on routes behind the tenant middleware; anywhere else the
/// extraction fails with a wiring error (500).
#[derive(Debug, Clone)]
pub struct CurrentOrganization(pub TenantState);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentOrganization
where
    S: Send + Sync,
{
    type Rejection = WiringRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        use_organization(&parts.extensions)
            .map(CurrentOrganization)
            .map_err(|e| WiringRejection::new(e.to_string(), parts.uri.path()))
    }
}

/// The request's tenant scope itself, for handlers that act on the provider
/// (refresh). Same wiring contract as [`CurrentOrganization`].
#[derive(Debug, Clone)]
pub struct CurrentScope(pub TenantScope);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentScope
where
    S: Send + Sync,
{
    type Rejection = WiringRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantScope>()
            .cloned()
            .map(CurrentScope)
            .ok_or_else(|| {
                WiringRejection::new("tenant scope accessed outside of the tenant middleware", parts.uri.path())
            })
    }
}

/// Session of the current request; same wiring contract as [`CurrentOrganization`].
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = WiringRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| {
                WiringRejection::new("session accessed outside of the session middleware", parts.uri.path())
            })
    }
}
