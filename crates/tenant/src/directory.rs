use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use congregate_core::{OrganizationId, ResolutionError};

use crate::{Organization, OrganizationSlug, TenantKey};

/// Source of organization records (the hosted `organizations` table in production).
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    async fn find_by_slug(&self, slug: &OrganizationSlug) -> Result<Option<Organization>, ResolutionError>;

    async fn find_by_id(&self, id: OrganizationId) -> Result<Option<Organization>, ResolutionError>;

    async fn find(&self, key: &TenantKey) -> Result<Option<Organization>, ResolutionError> {
        match key {
            TenantKey::Slug(slug) => self.find_by_slug(slug).await,
            TenantKey::Id(id) => self.find_by_id(*id).await,
        }
    }
}

#[async_trait]
impl<D> OrganizationDirectory for Arc<D>
where
    D: OrganizationDirectory + ?Sized,
{
    async fn find_by_slug(&self, slug: &OrganizationSlug) -> Result<Option<Organization>, ResolutionError> {
        (**self).find_by_slug(slug).await
    }

    async fn find_by_id(&self, id: OrganizationId) -> Result<Option<Organization>, ResolutionError> {
        (**self).find_by_id(id).await
    }
}

/// In-memory organization directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationDirectory {
    inner: RwLock<HashMap<OrganizationId, Organization>>,
}

impl InMemoryOrganizationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, organization: Organization) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(organization.id, organization);
        }
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<OrganizationId, Organization>>, ResolutionError>
    {
        self.inner
            .read()
            .map_err(|_| ResolutionError::new("organization directory lock poisoned"))
    }
}

#[async_trait]
impl OrganizationDirectory for InMemoryOrganizationDirectory {
    async fn find_by_slug(&self, slug: &OrganizationSlug) -> Result<Option<Organization>, ResolutionError> {
        let map = self.read()?;
        Ok(map.values().find(|o| &o.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: OrganizationId) -> Result<Option<Organization>, ResolutionError> {
        let map = self.read()?;
        Ok(map.get(&id).cloned())
    }
}
