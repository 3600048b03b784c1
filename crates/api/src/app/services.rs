use std::sync::Arc;

use congregate_auth::{InMemoryProfileDirectory, ProfileDirectory, SessionProvider};
use congregate_core::CacheLimits;
use congregate_tenant::{InMemoryOrganizationDirectory, OrganizationDirectory, TenantProvider};

use crate::seed::Seed;

/// Session and tenant providers shared by every request.
#[derive(Clone)]
pub struct AppServices {
    pub sessions: Arc<SessionProvider>,
    pub tenants: Arc<TenantProvider>,
}

impl AppServices {
    pub fn new(
        profiles: Arc<dyn ProfileDirectory>,
        organizations: Arc<dyn OrganizationDirectory>,
        limits: CacheLimits,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionProvider::new(profiles, limits)),
            tenants: Arc::new(TenantProvider::new(organizations, limits)),
        }
    }

    /// In-memory directories (dev/test), pre-filled from `seed`.
    pub fn in_memory(seed: &Seed, limits: CacheLimits) -> Self {
        let profiles = Arc::new(InMemoryProfileDirectory::new());
        let organizations = Arc::new(InMemoryOrganizationDirectory::new());
        seed.apply(&profiles, &organizations);
        Self::new(profiles, organizations, limits)
    }
}
