//! Session provider: the single writer of per-user profile snapshots.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use congregate_core::{CacheLimits, Lookup, SnapshotCache, SnapshotSource, UserId};

use crate::{JwtClaims, Profile, ProfileDirectory, Session};

/// Resolves profiles asynchronously and hands out [`Session`] snapshots.
///
/// The first request seen for a user starts a background lookup and reports a
/// loading session until it lands. Only found profiles stay cached; they are
/// looked up again once older than the cache ttl, or when a token issued
/// after the cached lookup shows up (login, token refresh). Logout goes
/// through [`SessionProvider::forget`].
pub struct SessionProvider {
    directory: Arc<dyn ProfileDirectory>,
    cache: Arc<SnapshotCache<UserId, Profile>>,
}

impl SessionProvider {
    pub fn new(directory: Arc<dyn ProfileDirectory>, limits: CacheLimits) -> Self {
        Self {
            directory,
            cache: Arc::new(SnapshotCache::new(limits)),
        }
    }

    /// Session of the bearer of `claims` (anonymous when `None`).
    ///
    /// Waits up to `wait` for a pending profile lookup to settle before taking
    /// the snapshot; a zero `wait` returns the latest snapshot immediately.
    pub async fn settled_session(&self, claims: Option<&JwtClaims>, wait: Duration) -> Session {
        let Some(claims) = claims else {
            return Session::anonymous();
        };

        let source = self.source(claims);
        settle(claims.sub, &source, wait).await
    }

    /// Start a new profile resolution for `user`, superseding any in flight,
    /// and wait up to `wait` for it.
    pub async fn refresh(&self, user: UserId, wait: Duration) -> Session {
        let source = self.cache.renew(&user);
        self.spawn_resolution(user, source.clone());
        settle(user, &source, wait).await
    }

    /// Drop everything known about `user` (logout).
    pub fn forget(&self, user: UserId) {
        if self.cache.remove(&user) {
            tracing::debug!(%user, "cached profile dropped");
        }
    }

    fn source(&self, claims: &JwtClaims) -> Arc<SnapshotSource<Profile>> {
        let user = claims.sub;
        let (source, lookup) = self
            .cache
            .lookup(&user, Some(SystemTime::from(claims.issued_at)));

        match lookup {
            Lookup::Fresh => {}
            Lookup::Created => self.spawn_resolution(user, source.clone()),
            Lookup::Stale => {
                tracing::debug!(%user, "cached profile outdated; resolving again");
                self.spawn_resolution(user, source.clone());
            }
        }
        source
    }

    fn spawn_resolution(&self, user: UserId, source: Arc<SnapshotSource<Profile>>) {
        let ticket = source.begin();
        let directory = self.directory.clone();
        let cache = self.cache.clone();

        tokio::spawn(async move {
            let outcome = directory.fetch_profile(user).await;
            match &outcome {
                Ok(Some(profile)) => tracing::debug!(%user, role = %profile.role, "profile resolved"),
                Ok(None) => tracing::debug!(%user, "user has no profile"),
                Err(e) => tracing::warn!(%user, error = %e, "profile resolution failed"),
            }

            // Misses and failures are answered once and not cached.
            if !matches!(outcome, Ok(Some(_))) && source.is_current(ticket) {
                cache.evict(&user, &source);
            }
            source.complete(ticket, outcome);
        });
    }
}

async fn settle(user: UserId, source: &SnapshotSource<Profile>, wait: Duration) -> Session {
    if !wait.is_zero() && source.snapshot().is_loading() {
        let mut rx = source.subscribe();
        let timed_out = tokio::time::timeout(wait, rx.wait_for(|s| !s.is_loading()))
            .await
            .is_err();
        if timed_out {
            tracing::debug!(%user, "profile still resolving after wait");
        }
    }

    Session::from_snapshot(user, &source.snapshot())
}
