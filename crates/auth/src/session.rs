use serde::{Deserialize, Serialize};

use congregate_core::{OrganizationId, Snapshot, UserId};

use crate::Role;

/// Application-level identity record of an authenticated user.
///
/// Distinct from the raw identity issued by the identity provider: the profile
/// is what assigns a role inside an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub role: Role,
    #[serde(default)]
    pub organization_ref: Option<OrganizationId>,
}

impl Profile {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            organization_ref: None,
        }
    }

    pub fn in_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_ref = Some(organization_id);
        self
    }
}

/// Read-only snapshot of the authentication state for one request.
///
/// Produced by the [`crate::SessionProvider`]; the guard only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: Option<UserId>,
    pub profile: Option<Profile>,
    pub loading: bool,
}

impl Session {
    /// No authenticated user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated user whose profile is still being resolved.
    pub fn loading(user: UserId) -> Self {
        Self {
            user: Some(user),
            profile: None,
            loading: true,
        }
    }

    /// Authenticated user with a resolved profile.
    pub fn authenticated(user: UserId, profile: Profile) -> Self {
        Self {
            user: Some(user),
            profile: Some(profile),
            loading: false,
        }
    }

    /// Build a session from the profile snapshot of `user`.
    ///
    /// A failed lookup leaves the profile absent; the error itself stays on
    /// the snapshot for whoever wants to display it.
    pub fn from_snapshot(user: UserId, snapshot: &Snapshot<Profile>) -> Self {
        Self {
            user: Some(user),
            profile: snapshot.value().cloned(),
            loading: snapshot.is_loading(),
        }
    }

    pub fn role(&self) -> Option<&Role> {
        self.profile.as_ref().map(|p| &p.role)
    }

    pub fn organization_ref(&self) -> Option<OrganizationId> {
        self.profile.as_ref().and_then(|p| p.organization_ref)
    }
}
