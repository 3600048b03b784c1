//! Tenant context provider.
//!
//! [`TenantProvider`] owns one snapshot per tenant key and is its only writer.
//! A [`TenantScope`] is the handle a request carries once it has passed
//! through the provider; code that needs the organization takes the scope (or
//! the state read from it) as an argument. [`use_organization`] is the lookup
//! for code that only has the request extensions, and it refuses to answer for
//! requests that never entered a scope.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use congregate_core::{CacheLimits, Lookup, ResolutionError, Snapshot, SnapshotCache, SnapshotSource};

use crate::{Organization, OrganizationDirectory, TenantKey};

/// Accessor used outside of any tenant scope.
///
/// A programming error in route wiring, not a data error: it never reaches
/// [`TenantState::error`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WiringError {
    #[error("organization accessed outside of a tenant provider scope")]
    OutsideProvider,
}

/// What descendants of the provider see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantState {
    pub organization: Option<Organization>,
    pub loading: bool,
    pub error: Option<ResolutionError>,
}

impl TenantState {
    fn from_snapshot(snapshot: &Snapshot<Organization>) -> Self {
        Self {
            organization: snapshot.value().cloned(),
            loading: snapshot.is_loading(),
            error: snapshot.error().cloned(),
        }
    }
}

/// A request's position inside the provider.
#[derive(Debug, Clone)]
pub struct TenantScope {
    key: Option<TenantKey>,
    source: Option<Arc<SnapshotSource<Organization>>>,
}

impl TenantScope {
    /// Scope for a navigation that targets no tenant.
    pub fn unscoped() -> Self {
        Self {
            key: None,
            source: None,
        }
    }

    pub fn key(&self) -> Option<&TenantKey> {
        self.key.as_ref()
    }

    pub fn state(&self) -> TenantState {
        match &self.source {
            Some(source) => TenantState::from_snapshot(&source.snapshot()),
            None => TenantState::from_snapshot(&Snapshot::empty()),
        }
    }

    /// Wait up to `wait` for an in-flight resolution, then read the state.
    pub async fn settled_state(&self, wait: Duration) -> TenantState {
        if let Some(source) = &self.source {
            if !wait.is_zero() && source.snapshot().is_loading() {
                let mut rx = source.subscribe();
                let timed_out = tokio::time::timeout(wait, rx.wait_for(|s| !s.is_loading()))
                    .await
                    .is_err();
                if timed_out {
                    tracing::debug!(key = ?self.key, "organization still resolving after wait");
                }
            }
        }
        self.state()
    }
}

/// Read the tenant state of a request.
///
/// Fails with [`WiringError::OutsideProvider`] when the request never went
/// through the tenant middleware.
pub fn use_organization(extensions: &http::Extensions) -> Result<TenantState, WiringError> {
    extensions
        .get::<TenantScope>()
        .map(TenantScope::state)
        .ok_or(WiringError::OutsideProvider)
}

/// Resolves organizations and caches one snapshot per tenant key.
///
/// Only keys that resolved to an organization stay cached, so arbitrary
/// subdomains and `X-Organization` hints cost one lookup each and no memory.
/// Cached organizations are looked up again once older than the cache ttl.
pub struct TenantProvider {
    directory: Arc<dyn OrganizationDirectory>,
    cache: Arc<SnapshotCache<TenantKey, Organization>>,
}

impl TenantProvider {
    pub fn new(directory: Arc<dyn OrganizationDirectory>, limits: CacheLimits) -> Self {
        Self {
            directory,
            cache: Arc::new(SnapshotCache::new(limits)),
        }
    }

    /// Scope for `key`, starting a resolution when the key is not cached or
    /// its cached organization is outdated.
    pub fn scope(&self, key: Option<TenantKey>) -> TenantScope {
        let Some(key) = key else {
            return TenantScope::unscoped();
        };

        let (source, lookup) = self.cache.lookup(&key, None);
        if lookup != Lookup::Fresh {
            self.spawn_resolution(key.clone(), source.clone());
        }

        TenantScope {
            key: Some(key),
            source: Some(source),
        }
    }

    /// Re-resolve `key` (tenant switch, branding change). Results of earlier
    /// generations that land afterwards are discarded.
    pub fn refresh(&self, key: &TenantKey) -> TenantScope {
        let source = self.cache.renew(key);
        self.spawn_resolution(key.clone(), source.clone());
        tracing::debug!(%key, "organization refresh started");

        TenantScope {
            key: Some(key.clone()),
            source: Some(source),
        }
    }

    fn spawn_resolution(&self, key: TenantKey, source: Arc<SnapshotSource<Organization>>) {
        let ticket = source.begin();
        let directory = self.directory.clone();
        let cache = self.cache.clone();

        tokio::spawn(async move {
            let outcome = directory.find(&key).await;
            match &outcome {
                Ok(Some(org)) => tracing::debug!(%key, organization = %org.slug, "organization resolved"),
                Ok(None) => tracing::debug!(%key, "no organization for key"),
                Err(e) => tracing::warn!(%key, error = %e, "organization resolution failed"),
            }

            if !matches!(outcome, Ok(Some(_))) && source.is_current(ticket) {
                cache.evict(&key, &source);
            }
            source.complete(ticket, outcome);
        });
    }
}
