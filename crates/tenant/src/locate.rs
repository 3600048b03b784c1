//! Tenant location: which organization does this navigation target?

use congregate_core::OrganizationId;

use crate::OrganizationSlug;

/// Key an organization is resolved by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TenantKey {
    Slug(OrganizationSlug),
    Id(OrganizationId),
}

impl core::fmt::Display for TenantKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TenantKey::Slug(slug) => write!(f, "slug:{slug}"),
            TenantKey::Id(id) => write!(f, "id:{id}"),
        }
    }
}

/// Derives a [`TenantKey`] from request hints.
///
/// Sources are tried in order: subdomain of `base_domain` in the host, then an
/// explicit slug (the `X-Organization` header), then the organization the
/// session profile points at. Malformed hints are skipped, not rejected.
#[derive(Debug, Clone, Default)]
pub struct TenantLocator {
    base_domain: Option<String>,
}

impl TenantLocator {
    pub fn new(base_domain: Option<String>) -> Self {
        Self {
            base_domain: base_domain.map(|d| d.trim_start_matches('.').to_ascii_lowercase()),
        }
    }

    pub fn locate(
        &self,
        host: Option<&str>,
        explicit_slug: Option<&str>,
        session_claim: Option<OrganizationId>,
    ) -> Option<TenantKey> {
        if let Some(slug) = host.and_then(|h| self.subdomain(h)) {
            return Some(TenantKey::Slug(slug));
        }

        if let Some(raw) = explicit_slug {
            match OrganizationSlug::parse(raw.trim()) {
                Ok(slug) => return Some(TenantKey::Slug(slug)),
                Err(e) => tracing::debug!(error = %e, "ignoring malformed organization hint"),
            }
        }

        session_claim.map(TenantKey::Id)
    }

    fn subdomain(&self, host: &str) -> Option<OrganizationSlug> {
        let base = self.base_domain.as_deref()?;
        let host = host.split(':').next()?.to_ascii_lowercase();
        let label = host.strip_suffix(base)?.strip_suffix('.')?;

        // Only a single label directly under the base domain names a tenant.
        if label.contains('.') || label == "www" {
            return None;
        }
        OrganizationSlug::parse(label).ok()
    }
}
