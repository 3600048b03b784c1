use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use congregate_core::{ResolutionError, UserId};

use crate::Profile;

/// Source of application profiles (the hosted `profiles` table in production).
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Look up the profile of `user`. `Ok(None)` means the user has no profile.
    async fn fetch_profile(&self, user: UserId) -> Result<Option<Profile>, ResolutionError>;
}

#[async_trait]
impl<D> ProfileDirectory for Arc<D>
where
    D: ProfileDirectory + ?Sized,
{
    async fn fetch_profile(&self, user: UserId) -> Result<Option<Profile>, ResolutionError> {
        (**self).fetch_profile(user).await
    }
}

/// In-memory profile directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProfileDirectory {
    inner: RwLock<HashMap<UserId, Profile>>,
}

impl InMemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, user: UserId, profile: Profile) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(user, profile);
        }
    }

    pub fn remove(&self, user: UserId) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(&user);
        }
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryProfileDirectory {
    async fn fetch_profile(&self, user: UserId) -> Result<Option<Profile>, ResolutionError> {
        let map = self
            .inner
            .read()
            .map_err(|_| ResolutionError::new("profile directory lock poisoned"))?;
        Ok(map.get(&user).cloned())
    }
}
